//! Payment risk orchestration: 3-D Secure vendor strategies, fraud data collectors, and
//! deterministic DOM cleanup behind one event contract.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod dom;
pub mod error;
pub mod event;
pub mod fraud;
pub mod frame;
pub mod http;
pub mod loader;
pub mod obs;
pub mod page;
pub mod three_d_secure;
pub mod vendor;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::{Arc, Weak},
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
