//! `navgate-guard`: the navigation guard pipeline.
//!
//! Every navigation goes through [`Navigator`], which resolves the target
//! against the route graph and asks [`GuardPipeline`] whether to allow,
//! block, redirect or re-dispatch it. [`Portal`] ties the pieces to the
//! session lifecycle.

pub mod decision;
pub mod error;
pub mod location;
pub mod navigator;
pub mod pipeline;
pub mod portal;
pub mod signals;
pub mod tabs;

pub use decision::{GuardContext, GuardDecision, NavigationId, Redirect};
pub use error::{NavigationError, PortalError};
pub use location::RouteLocation;
pub use navigator::{CurrentRoute, NavigationOutcome, Navigator};
pub use pipeline::{GuardPipeline, login_location};
pub use portal::{Portal, PortalParts};
pub use signals::{RecordingSignals, SignalEvent, Signals, TracingSignals};
pub use tabs::{Tab, TabStore};
