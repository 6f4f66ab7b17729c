//! geobank-cli
//! ===========
//!
//! Command-line interface for the `geobank-core` population pipeline.
//!
//! The binary (`geobank`) is the deliverable; this library target only
//! exists so the crate gets a rendered documentation page.
//!
//! ```text
//! geobank populate --languages de,fr --min-population 15000
//! geobank --input geobank.bin stats
//! geobank country FR
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
