/*
    egabench
    https://github.com/dbalsom/egabench

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------
*/

//! egabench headless front-end. Parses the command line, loads the two
//! planar image assets, runs the three benchmark phases and reports the
//! per-iteration timings.

#![forbid(unsafe_code)]

mod cmdline;
mod palette;

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};

use egabench_core::{
    display::{DisplayIo, FRAME_BUFFER_SIZE},
    harness::{self, BenchmarkAssets, BenchmarkConfig, BenchmarkResults},
    machine::Machine,
};

use crate::cmdline::CmdLineArgs;

pub fn run() -> Result<()> {
    env_logger::init();

    let args = cmdline::cmd_line_args().run();
    log::debug!("Command line: {:?}", args);

    let mut machine = Machine::new();
    DisplayIo::new(machine.bus_mut()).init_video();
    palette::set_default_palette(machine.bus_mut());

    let result = run_benchmarks(&mut machine, &args);

    // Teardown runs on every path out. The harness restores the timer on
    // its own; this only has work to do if a phase bailed after install.
    let (clock, bus) = machine.clock_and_bus_mut();
    if clock.is_installed() {
        if let Err(err) = clock.uninstall(bus) {
            log::error!("Timer teardown failed: {}", err);
        }
    }
    DisplayIo::new(machine.bus_mut()).exit_video();

    report(&result?);
    Ok(())
}

fn run_benchmarks(machine: &mut Machine, args: &CmdLineArgs) -> Result<BenchmarkResults> {
    let fullscreen = load_asset(&args.image)?;
    let tileset = load_asset(&args.tiles)?;

    let config = BenchmarkConfig {
        iterations: args.iterations,
        timer_rate: args.timer_rate,
        ..Default::default()
    };
    let assets = BenchmarkAssets {
        fullscreen: &fullscreen,
        tileset: &tileset,
    };

    harness::run(machine, &config, &assets)
        .with_context(|| format!("Benchmark failed at {} Hz", args.timer_rate))
}

fn load_asset(path: &Path) -> Result<Box<[u8; FRAME_BUFFER_SIZE]>> {
    let data =
        fs::read(path).with_context(|| format!("Failed to read image asset {}", path.display()))?;

    if data.len() < FRAME_BUFFER_SIZE {
        bail!(
            "Image asset {} is short: expected {} bytes, got {}",
            path.display(),
            FRAME_BUFFER_SIZE,
            data.len()
        );
    }

    let mut buffer = Box::new([0u8; FRAME_BUFFER_SIZE]);
    buffer.copy_from_slice(&data[..FRAME_BUFFER_SIZE]);
    Ok(buffer)
}

fn report(results: &BenchmarkResults) {
    println!("Results for {} iterations:", results.iterations);
    println!(
        "{:.6} ms plain, {:.6} ms tiled (fast), {:.6} ms tiled (slow)",
        results.plain_ms(),
        results.tiled_ms(),
        results.tiled_slow_ms()
    );
}
