// This file is part of the open-source port of SeetaFace engine, which originally includes three modules:
//      SeetaFace Detection, SeetaFace Alignment, and SeetaFace Identification.
//
// This file is part of the SeetaFace Detection module, containing codes implementing the face detection method described in the following paper:
//
//      Funnel-structured cascade for multi-view face detection with alignment awareness,
//      Shuzhe Wu, Meina Kan, Zhenliang He, Shiguang Shan, Xilin Chen.
//      In Neurocomputing (under review)
//
// Copyright (C) 2016, Visual Information Processing and Learning (VIPL) group,
// Institute of Computing Technology, Chinese Academy of Sciences, Beijing, China.
//
// As an open-source face recognition engine: you can redistribute SeetaFace source codes
// and/or modify it under the terms of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use std::cmp;

/// A single-channel image with `f64` intensities, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<f64>,
}

impl Image {
    pub fn new(width: u32, height: u32) -> Self {
        Image {
            width,
            height,
            pixels: vec![0.0; (width * height) as usize],
        }
    }

    /// # Panics
    ///
    /// Panics if `pixels.len()` is not `width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<f64>) -> Self {
        if pixels.len() != (width * height) as usize {
            panic!(
                "Illegal image buffer: {} pixels for {}x{} image",
                pixels.len(),
                width,
                height
            );
        }
        Image {
            width,
            height,
            pixels,
        }
    }

    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> f64,
    {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Image {
            width,
            height,
            pixels,
        }
    }

    /// Builds an image from 8-bit gray-scale data, mapping intensities to `[0, 1]`.
    pub fn from_luma8(width: u32, height: u32, data: &[u8]) -> Self {
        Image::from_pixels(
            width,
            height,
            data.iter().map(|&v| f64::from(v) / 255.0).collect(),
        )
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.pixels[(y * self.width + x) as usize]
    }

    #[inline]
    fn get_or_zero(&self, x: i64, y: i64) -> f64 {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            0.0
        } else {
            self.pixels[(y as u64 * u64::from(self.width) + x as u64) as usize]
        }
    }

    /// Bilinear interpolation at `(x, y)`; pixels outside the image read as zero.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let wx = x - x0;
        let wy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let d1 = self.get_or_zero(x0, y0);
        let d2 = self.get_or_zero(x0 + 1, y0);
        let d3 = self.get_or_zero(x0, y0 + 1);
        let d4 = self.get_or_zero(x0 + 1, y0 + 1);

        (1.0 - wy) * ((1.0 - wx) * d1 + wx * d2) + wy * ((1.0 - wx) * d3 + wx * d4)
    }

    /// Rescales the image so that a point `p` maps to `p * factor`.
    pub fn rescale(&self, factor: f64) -> Image {
        let width = cmp::max((f64::from(self.width) * factor).round() as u32, 1);
        let height = cmp::max((f64::from(self.height) * factor).round() as u32, 1);
        if width == self.width && height == self.height && factor == 1.0 {
            return self.clone();
        }

        let max_x = f64::from(self.width.saturating_sub(1));
        let max_y = f64::from(self.height.saturating_sub(1));
        Image::from_fn(width, height, |x, y| {
            let xs = num::clamp(f64::from(x) / factor, 0.0, max_x);
            let ys = num::clamp(f64::from(y) / factor, 0.0, max_y);
            self.sample(xs, ys)
        })
    }

    /// Gradient magnitude from central differences (one-sided at the borders).
    pub fn gradient_magnitude(&self) -> Image {
        let w = self.width;
        let h = self.height;
        Image::from_fn(w, h, |x, y| {
            let gx = derivative(x, w, |i| self.get(i, y));
            let gy = derivative(y, h, |i| self.get(x, i));
            (gx * gx + gy * gy).sqrt()
        })
    }
}

/// Finite difference of `f` at `i` along an axis of length `len`.
pub(crate) fn derivative<F>(i: u32, len: u32, f: F) -> f64
where
    F: Fn(u32) -> f64,
{
    if len < 2 {
        0.0
    } else if i == 0 {
        f(1) - f(0)
    } else if i == len - 1 {
        f(i) - f(i - 1)
    } else {
        (f(i + 1) - f(i - 1)) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bilinear_sampling() {
        let image = Image::from_fn(4, 4, |x, y| f64::from(x + 10 * y));
        assert_relative_eq!(image.sample(1.5, 2.0), 21.5);
        assert_relative_eq!(image.sample(1.0, 1.5), 16.0);
        assert_eq!(image.sample(-5.0, -5.0), 0.0);
    }

    #[test]
    fn test_rescale_dimensions() {
        let image = Image::from_fn(10, 6, |x, _| f64::from(x));
        let half = image.rescale(0.5);
        assert_eq!((half.width(), half.height()), (5, 3));
        // pixel x in the half-size image sits at 2x in the source
        assert_relative_eq!(half.get(2, 1), 4.0);
        assert_eq!(image.rescale(1.0), image);
    }

    #[test]
    fn test_gradient_magnitude_of_ramp() {
        let image = Image::from_fn(5, 5, |x, _| 3.0 * f64::from(x));
        let grad = image.gradient_magnitude();
        for y in 0..5 {
            for x in 0..5 {
                assert_relative_eq!(grad.get(x, y), 3.0);
            }
        }
    }

    #[test]
    #[should_panic]
    fn test_illegal_buffer() {
        Image::from_pixels(3, 3, vec![0.0; 4]);
    }
}
