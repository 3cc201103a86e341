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

    ega::vram.rs

    Implements the EGA card's video RAM: four parallel planes of 64k each.
    A CPU-visible byte address touches the same offset in every enabled
    plane; which planes a write reaches is decided upstream by the sequencer
    map mask.

*/

use crate::devices::ega::EGA_GFX_PLANE_SIZE;

pub struct Vram {
    planes: Box<[[u8; EGA_GFX_PLANE_SIZE]; 4]>,
}

impl Vram {
    pub fn new() -> Self {
        Self {
            planes: vec![
                [0; EGA_GFX_PLANE_SIZE],
                [0; EGA_GFX_PLANE_SIZE],
                [0; EGA_GFX_PLANE_SIZE],
                [0; EGA_GFX_PLANE_SIZE],
            ]
            .into_boxed_slice()
            .try_into()
            .unwrap(),
        }
    }

    #[inline]
    pub fn read_u8(&self, plane: usize, offset: usize) -> u8 {
        self.planes[plane][offset & 0xFFFF]
    }

    #[inline]
    pub fn plane_set(&mut self, p: usize, offset: usize, data: u8) {
        self.planes[p][offset] = data;
    }

    #[inline]
    pub fn plane_and(&mut self, p: usize, offset: usize, data: u8) {
        self.planes[p][offset] &= data;
    }

    #[inline]
    pub fn plane_or(&mut self, p: usize, offset: usize, data: u8) {
        self.planes[p][offset] |= data;
    }

    pub fn plane_len(&self) -> usize {
        self.planes[0].len()
    }

    pub fn plane_slice(&self, plane: usize) -> &[u8] {
        &self.planes[plane]
    }
}
