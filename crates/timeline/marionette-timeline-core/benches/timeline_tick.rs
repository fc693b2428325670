use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marionette_timeline_core::{
    evaluate_curve, resolve_auto_tangents, ActuatorCurve, ActuatorService, Animation,
    BatchedCommand, CommandToken, Config, Key, PositionChannel, SegmentLimits, ServiceError,
    TickOutcome, TimelineState, Unit,
};

struct Sink;

impl ActuatorService for Sink {
    fn are_resources_available(&self, _: &[String]) -> Result<bool, ServiceError> {
        Ok(true)
    }
    fn preempt(&self, _: &[String]) -> Result<(), ServiceError> {
        Ok(())
    }
    fn dispatch_immediate(&self, _: &[String], values: &[f32], _: f32) -> Result<(), ServiceError> {
        black_box(values);
        Ok(())
    }
    fn dispatch_batched(&self, command: &BatchedCommand) -> Result<CommandToken, ServiceError> {
        black_box(command);
        Ok(CommandToken(1))
    }
    fn cancel(&self, _: CommandToken) -> Result<(), ServiceError> {
        Ok(())
    }
}

impl PositionChannel for Sink {
    fn publish(&self, _: &str, _: i32) -> Result<(), ServiceError> {
        Ok(())
    }
}

fn body_animation(actuators: usize, keys: i32) -> Animation {
    let mut animation = Animation::new("bench", 25);
    for a in 0..actuators {
        let mut curve = ActuatorCurve::new(format!("Joint{a}"), Unit::Degree);
        for k in 0..keys {
            let value = ((k as f32) * 0.7 + a as f32).sin() * 45.0;
            curve = curve.with_key(k * 8, Key::auto(value));
        }
        animation = animation.with_curve(curve);
    }
    animation
}

fn bench_timeline(c: &mut Criterion) {
    let sink = Arc::new(Sink);

    c.bench_function("timeline/play_through(actuators=24,keys=32)", |b| {
        let animation = body_animation(24, 32);
        b.iter(|| {
            let mut tl = TimelineState::new(Config::default(), sink.clone(), sink.clone());
            tl.bind(animation.clone());
            tl.play();
            while tl.update() == TickOutcome::Continue {}
            black_box(tl.current_frame());
        })
    });

    c.bench_function("timeline/scrub(actuators=24,keys=32)", |b| {
        let mut tl = TimelineState::new(Config::default(), sink.clone(), sink.clone());
        tl.bind(body_animation(24, 32));
        b.iter(|| {
            for frame in 0..tl.end_frame() {
                tl.set_current_frame(frame);
                black_box(tl.update());
            }
        })
    });

    c.bench_function("sampling/evaluate_curve(keys=32)", |b| {
        let mut curve = body_animation(1, 32).curves.remove(0);
        resolve_auto_tangents(&mut curve);
        b.iter(|| {
            let mut acc = 0.0;
            for frame in 0..256 {
                acc += evaluate_curve(&curve, frame, SegmentLimits::default()).unwrap_or(0.0);
            }
            black_box(acc)
        })
    });
}

criterion_group!(benches, bench_timeline);
criterion_main!(benches);
