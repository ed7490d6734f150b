// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod api;
pub mod cache;
pub mod forms;
pub mod ids;
pub mod model;
pub mod rows;
pub mod session;

pub use api::*;
pub use cache::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use rows::*;
pub use session::*;
