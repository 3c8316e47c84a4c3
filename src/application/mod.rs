// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用层模块
///
/// 编排领域对象完成业务用例
pub mod usecases;
