// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod cooperative;
pub mod process_pool;
pub mod reqwest_engine;
pub mod router;
pub mod thread_pool;
pub mod traits;

#[cfg(test)]
pub mod test_support;
