//! A free-running clock driving an 8-bit wrapping counter, wired through
//! `verisocks-cycle`'s Embedding B surface. Connect with any Verisocks
//! client and `run {cb:"until_change", path:"count", value:N}` to watch it
//! tick.

use clap::Parser;

use verisocks_core::{ExitCode, Primitive, Value};
use verisocks_cycle::{CycleModel, Driver};

#[derive(Parser)]
#[command(about = "Toy counter demo for the verisocks-cycle embedding")]
struct Args {
    #[arg(long, default_value_t = verisocks_cycle::DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value_t = verisocks_cycle::DEFAULT_TIMEOUT_SEC)]
    timeout_seconds: u32,

    /// Clock half-period in simulated nanoseconds.
    #[arg(long, default_value_t = 5)]
    half_period_ns: u64,
}

struct CounterModel {
    prev_clk: u8,
}

impl CycleModel for CounterModel {
    fn eval(&mut self, registry: &mut verisocks_core::Registry, clocks: &verisocks_core::ClockMap) {
        let clk = clocks.get("clk").expect("registered at startup").value();
        if self.prev_clk == 0 && clk == 1 {
            let count = registry.get("count").expect("registered at startup");
            let next = match count.read_scalar() {
                Value::Int(i) => (i + 1) % 256,
                _ => 0,
            };
            count
                .write_scalar(&Value::Int(next))
                .expect("count is a plain u8 scalar");
        }
        self.prev_clk = clk;
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let model = CounterModel { prev_clk: 0 };

    let driver = Driver::new(model, "toy_counter")
        .model_hier_name("tb.toy_counter")
        .precision_exp10(-9)
        .port(args.port)
        .timeout_seconds(args.timeout_seconds)
        .register_scalar("count", Primitive::U8, 8)
        .and_then(|d| d.register_clock("clk", args.half_period_ns * 2, 0.5));

    let driver = match driver {
        Ok(d) => d,
        Err(err) => {
            tracing::error!(%err, "failed to assemble toy-counter model");
            std::process::exit(ExitCode::Error.as_i32());
        }
    };

    std::process::exit(driver.run().as_i32());
}
