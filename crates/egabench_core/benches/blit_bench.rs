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

    ---------------------------------------------------------------------------

    benches::blit_bench.rs

    Benchmarks for the three blit strategies against the emulated card.

*/

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use egabench_core::{
    blit,
    display::{DisplayIo, FRAME_BUFFER_SIZE, TILE_BANK_OFFSET},
    machine::Machine,
};

fn frame_buffer() -> Box<[u8; FRAME_BUFFER_SIZE]> {
    let v: Vec<u8> = (0..FRAME_BUFFER_SIZE).map(|i| (i * 7) as u8).collect();
    v.into_boxed_slice().try_into().unwrap()
}

pub fn blit_bench(c: &mut Criterion) {
    let buffer = frame_buffer();

    c.bench_function("blit_fullscreen", |b| {
        let mut machine = Machine::new();
        let mut dsp = DisplayIo::new(machine.bus_mut());
        dsp.init_video();

        b.iter(|| {
            blit::draw_fullscreen(&mut dsp, black_box(&buffer), 0);
        });
    });

    c.bench_function("blit_tiled_latch", |b| {
        let mut machine = Machine::new();
        let mut dsp = DisplayIo::new(machine.bus_mut());
        dsp.init_video();
        dsp.copy_planar(&buffer[..], TILE_BANK_OFFSET);

        b.iter(|| {
            blit::draw_tiled(&mut dsp, black_box(0));
        });
    });

    c.bench_function("blit_tiled_slow", |b| {
        let mut machine = Machine::new();
        let mut dsp = DisplayIo::new(machine.bus_mut());
        dsp.init_video();

        b.iter(|| {
            blit::draw_tiled_slow(&mut dsp, black_box(&buffer), 0);
        });
    });
}

criterion_group!(benches, blit_bench);
criterion_main!(benches);
