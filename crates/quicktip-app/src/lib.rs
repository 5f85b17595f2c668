// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod calculator;
pub mod format;
pub mod forms;
pub mod history;
pub mod ids;
pub mod model;
pub mod state;

pub use calculator::*;
pub use format::*;
pub use forms::*;
pub use history::*;
pub use ids::*;
pub use model::*;
pub use state::*;
