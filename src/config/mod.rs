// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
pub mod settings;

#[cfg(test)]
mod settings_test;
