use criterion::{criterion_group, criterion_main, Criterion};
use robot_core::{Processor, ResourceKind};
use robot_sensors::{build_sensor, SensorKind, SensorRegistry, SensorSpecs};
use robot_upgrades::{basic_catalog, Robot};

fn bench_apply(c: &mut Criterion) {
    let mut sensors = SensorRegistry::with_seed(42);
    sensors.register(
        build_sensor(
            SensorKind::Temperature,
            SensorSpecs {
                range: 10.0,
                precision: 0.9,
                power_consumption: 0.5,
            },
        )
        .unwrap(),
    );
    let mut robot = Robot::new("BENCH-01", sensors, Processor::default(), basic_catalog());
    c.bench_function("apply_precision_upgrade", |b| {
        b.iter(|| {
            robot.grant(ResourceKind::Silicon, 5);
            robot.grant(ResourceKind::Copper, 5);
            let _ = robot.apply("basic-precision-1");
        })
    });
}

criterion_group!(benches, bench_apply);
criterion_main!(benches);
