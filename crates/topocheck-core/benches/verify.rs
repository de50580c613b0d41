use criterion::{Criterion, criterion_group, criterion_main};
use std::{fmt::Write, hint::black_box};
use topocheck_core::TopoMatcher;
use topocheck_testkit::{CALIBRATION_TEMPLATE, Fake, reorder};

// user node plus `services` instances, all named by one composite template
fn fan_out_template(services: u32) -> String {
    let mut toml = String::from(
        "[variables]\nper_entity = [\"pid\"]\n\n[[nodes]]\nid = \"1\"\nname = \"User\"\n",
    );

    for seed in 0..services {
        let id = seed + 2;
        let _ = write!(
            toml,
            "\n[[nodes]]\nid = \"{id}\"\nname = \"${{project}}-pid:${{pid}}@${{host}}\"\ntype = \"Tomcat\"\n\
             \n[[calls]]\nid = \"1-{id}\"\nsource = \"1\"\ntarget = \"{id}\"\n"
        );
    }

    toml
}

fn bench_calibration(c: &mut Criterion) {
    let matcher = TopoMatcher::from_toml(CALIBRATION_TEMPLATE).unwrap();
    let actual = Fake::fan_out("projectB", 2);

    c.bench_function("verify calibration", |b| {
        b.iter(|| black_box(matcher.verify(black_box(&actual))));
    });
}

fn bench_fan_out(c: &mut Criterion) {
    let matcher = TopoMatcher::from_toml(&fan_out_template(200)).unwrap();
    let actual = reorder(Fake::fan_out("projectB", 200), 3);

    c.bench_function("verify fan-out 200", |b| {
        b.iter(|| black_box(matcher.verify(black_box(&actual))));
    });
}

fn bench_load(c: &mut Criterion) {
    let toml = fan_out_template(200);

    c.bench_function("load fan-out 200 template", |b| {
        b.iter(|| black_box(TopoMatcher::from_toml(black_box(&toml)).unwrap()));
    });
}

criterion_group!(benches, bench_calibration, bench_fan_out, bench_load);
criterion_main!(benches);
