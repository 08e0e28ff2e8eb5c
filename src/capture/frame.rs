//! Captured image and crop region

use image::DynamicImage;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use super::{CaptureError, ImageLocator};

/// Rectangle in source pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Non-empty and fully inside a `width` x `height` image
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

impl fmt::Display for CropRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for CropRegion {
    type Err = String;

    /// Parses `X,Y,W,H`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid crop '{}': {}", s, e))?;

        match parts.as_slice() {
            [x, y, w, h] => Ok(Self::new(*x, *y, *w, *h)),
            _ => Err(format!("invalid crop '{}': expected X,Y,W,H", s)),
        }
    }
}

/// A photo selected for recognition, with an optional crop applied
#[derive(Debug)]
pub struct CapturedImage {
    /// Where the photo came from
    pub locator: ImageLocator,
    /// Decoded pixels (cropped once `crop` succeeds)
    pub image: DynamicImage,
    /// When the photo was selected
    pub timestamp: Instant,
}

impl CapturedImage {
    pub fn new(locator: ImageLocator, image: DynamicImage) -> Self {
        Self {
            locator,
            image,
            timestamp: Instant::now(),
        }
    }

    /// Image dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Replace the image with the given region of itself
    pub fn crop(&mut self, region: CropRegion) -> Result<(), CaptureError> {
        let (width, height) = self.dimensions();
        if !region.fits(width, height) {
            return Err(CaptureError::InvalidCrop { region, width, height });
        }
        self.image = self.image.crop_imm(region.x, region.y, region.width, region.height);
        Ok(())
    }
}
