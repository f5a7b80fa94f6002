// Copyright 2025 ModerRAS
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Moondream
//!
//! Client for the Moondream vision API.
//!
//! Four operations are exposed: image captioning, visual question answering,
//! object detection and object pointing. All of them share one request
//! executor that retries transient failures with linear backoff and stops
//! as soon as the supplied [`CancellationToken`](tokio_util::sync::CancellationToken)
//! fires.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use moondream::{CaptionLength, ClientConfig, VisionClient};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::default().with_timeout(Duration::from_secs(10));
//!     let client = VisionClient::new("my-api-key", config)?;
//!     let cancel = CancellationToken::new();
//!
//!     let caption = client
//!         .caption(&cancel, "cat.jpg", CaptionLength::Short, false)
//!         .await?;
//!     println!("Caption: {}", caption);
//!
//!     for bbox in client.detect(&cancel, "cat.jpg", "cat").await? {
//!         println!("{:?}", bbox);
//!     }
//!     Ok(())
//! }
//! ```

pub mod settings;
pub mod vision;

pub use settings::AppSettings;
pub use vision::{
    ApiError, BoundingBox, CaptionLength, ClientConfig, Point, VisionClient, VisionError,
};
