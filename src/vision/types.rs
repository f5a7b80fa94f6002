//! Request and response payloads for the vision endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caption length requested from `/caption`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionLength {
    Short,
    Normal,
    #[default]
    Long,
}

impl CaptionLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionLength::Short => "short",
            CaptionLength::Normal => "normal",
            CaptionLength::Long => "long",
        }
    }
}

impl fmt::Display for CaptionLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptionLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(CaptionLength::Short),
            "normal" => Ok(CaptionLength::Normal),
            "long" => Ok(CaptionLength::Long),
            other => Err(format!(
                "invalid caption length '{}', expected short, normal or long",
                other
            )),
        }
    }
}

/// Bounding box of a detected object, in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

/// Point located on an object, in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CaptionRequest<'a> {
    pub image_url: &'a str,
    pub length: CaptionLength,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryRequest<'a> {
    pub image_url: &'a str,
    pub question: &'a str,
}

/// Shared by `/detect` and `/point`.
#[derive(Debug, Serialize)]
pub(crate) struct ObjectRequest<'a> {
    pub image_url: &'a str,
    pub object: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaptionResponse {
    pub caption: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    pub answer: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetectResponse {
    pub objects: Vec<BoundingBox>,
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PointResponse {
    pub points: Vec<Point>,
    pub request_id: Option<String>,
}

/// Responses that may carry a server-side request id.
pub(crate) trait Traced {
    fn request_id(&self) -> Option<&str>;
}

macro_rules! impl_traced {
    ($($ty:ty),*) => {
        $(impl Traced for $ty {
            fn request_id(&self) -> Option<&str> {
                self.request_id.as_deref()
            }
        })*
    };
}

impl_traced!(CaptionResponse, QueryResponse, DetectResponse, PointResponse);
