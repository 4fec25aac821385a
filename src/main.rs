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

use std::env::Args;
use std::time::{Duration, Instant};

use image::{DynamicImage, Rgb};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use log::info;

use rustaps::{ApsResult, BoundingBox, FitterConfig, GaussNewtonApsFitter, Image, MultiScaleFitter};

const OUTPUT_FILE: &str = "fitted.png";

fn main() {
    env_logger::init();

    let options = match Options::parse(std::env::args()) {
        Ok(options) => options,
        Err(message) => {
            println!("Failed to parse program arguments: {}", message);
            std::process::exit(1)
        }
    };

    let config = match options.config_path() {
        Some(path) => match rustaps::load_config(path) {
            Ok(config) => config,
            Err(error) => {
                println!("Failed to load fitter configuration: {}", error);
                std::process::exit(1)
            }
        },
        None => FitterConfig::default(),
    };

    let fitter = match rustaps::create_fitter(options.model_path(), &config) {
        Ok(fitter) => fitter,
        Err(error) => {
            println!("Failed to create fitter: {}", error);
            std::process::exit(1)
        }
    };

    let image: DynamicImage = match image::open(options.image_path()) {
        Ok(image) => image,
        Err(message) => {
            println!("Failed to read image: {}", message);
            std::process::exit(1)
        }
    };

    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    let input = Image::from_luma8(width, height, gray.as_raw());

    let result = match fit(&fitter, &input, options.bbox()) {
        Ok(result) => result,
        Err(error) => {
            println!("Failed to fit model: {}", error);
            std::process::exit(1)
        }
    };

    let mut rgb = image.to_rgb8();
    let bbox = options.bbox();
    let rect = Rect::at(bbox.x() as i32, bbox.y() as i32)
        .of_size(bbox.width().max(1.0) as u32, bbox.height().max(1.0) as u32);
    draw_hollow_rect_mut(&mut rgb, rect, Rgb([0, 0, 255]));

    for (i, point) in result.final_shape().points().iter().enumerate() {
        println!("{} {:.3} {:.3}", i, point.x, point.y);
        draw_cross_mut(&mut rgb, Rgb([255, 0, 0]), point.x.round() as i32, point.y.round() as i32);
    }

    match rgb.save(OUTPUT_FILE) {
        Ok(_) => println!("Saved result to {}", OUTPUT_FILE),
        Err(message) => println!("Failed to save result to a file. Reason: {}", message),
    }
}

fn fit(fitter: &GaussNewtonApsFitter, image: &Image, bbox: &BoundingBox) -> rustaps::Result<ApsResult> {
    let now = Instant::now();
    let result = fitter.fit_from_bb(image, bbox, None)?;
    info!(
        "Fitted {} landmarks in {} iterations, {} ms",
        result.final_shape().n_points(),
        result.n_iters(),
        get_millis(now.elapsed())
    );
    Ok(result)
}

fn get_millis(duration: Duration) -> u64 {
    duration.as_secs() * 1000u64 + u64::from(duration.subsec_nanos() / 1_000_000)
}

struct Options {
    model_path: String,
    image_path: String,
    bbox: BoundingBox,
    config_path: Option<String>,
}

impl Options {
    fn parse(args: Args) -> Result<Self, String> {
        let args: Vec<String> = args.into_iter().collect();
        if args.len() != 7 && args.len() != 8 {
            return Err(format!(
                "Usage: {} <model-path> <image-path> <x> <y> <width> <height> [config-path]",
                args.first().map(String::as_str).unwrap_or("rustaps")
            ));
        }

        let model_path = args[1].clone();
        let image_path = args[2].clone();

        let mut coords = [0.0; 4];
        for (coord, arg) in coords.iter_mut().zip(&args[3..7]) {
            *coord = arg
                .parse::<f64>()
                .map_err(|e| format!("Illegal bounding box value '{}': {}", arg, e))?;
        }
        if coords[2] <= 0.0 || coords[3] <= 0.0 {
            return Err("Bounding box width and height must be positive".to_string());
        }
        let bbox = BoundingBox::new(coords[0], coords[1], coords[2], coords[3]);

        let config_path = args.get(7).cloned();

        Ok(Options {
            model_path,
            image_path,
            bbox,
            config_path,
        })
    }

    fn model_path(&self) -> &str {
        &self.model_path[..]
    }

    fn image_path(&self) -> &str {
        &self.image_path[..]
    }

    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }
}
