use xpedite::{
    BridgeCell, CallsiteRegistry, Config, Probe,
    unit::{self, Instr, Method, Op, Unit},
};
use xpedite_host::Host;
use xpedite_recorder::StreamEngineLoader;

const APP: &str = "com/xpedite/demo/App";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let host = Host::new();
    host.load(APP, unit::encode(&demo_app()).unwrap()).unwrap();

    let registry = CallsiteRegistry::process();
    let probes = vec![
        Probe::anchored(registry, APP, "doCompute", 12),
        Probe::scoped(registry, APP, "doCompute"),
        Probe::scoped(registry, APP, "doIo"),
    ];

    let loader = StreamEngineLoader::from_env();
    let activation =
        xpedite::activate_probes(&probes, &host, &loader, &Config::from_env()).unwrap();
    println!(
        "activated {} call sites, samples go to {}",
        activation.call_sites,
        loader.path().display()
    );

    let bridge = BridgeCell::process().get().unwrap();
    let outcome = host
        .invoke(APP, "run", 0, bridge.engine().as_ref())
        .unwrap();
    println!("run finished: {outcome:?}");

    bridge.flush().unwrap();
}

fn demo_app() -> Unit {
    Unit::new(APP)
        .with_method(Method::new(
            "run",
            vec![
                Instr::at_line(
                    4,
                    Op::Repeat {
                        times: 100,
                        body: vec![
                            Instr::at_line(
                                5,
                                Op::Invoke {
                                    method: "doCompute".into(),
                                },
                            ),
                            Instr::at_line(
                                6,
                                Op::Invoke {
                                    method: "doIo".into(),
                                },
                            ),
                        ],
                    },
                ),
                Instr::at_line(8, Op::Return),
            ],
        ))
        .with_method(Method::new(
            "doCompute",
            vec![
                Instr::at_line(
                    11,
                    Op::Work {
                        label: "read clock".into(),
                    },
                ),
                Instr::at_line(
                    12,
                    Op::Work {
                        label: "spin".into(),
                    },
                ),
                Instr::at_line(17, Op::Return),
            ],
        ))
        .with_method(Method::new(
            "doIo",
            vec![Instr::at_line(
                24,
                Op::Work {
                    label: "print".into(),
                },
            )],
        ))
}
