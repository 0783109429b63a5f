//! # 网页剪贴板 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  web ──────── warp 路由（JSON / 表单）+ 错误映射          │
//! │   │                                                      │
//! │   ▼                                                      │
//! │  service ──── ClipboardService：CRUD 编排 + 创建验证闸门  │
//! │   │                    │                                 │
//! │   ▼                    ▼                                 │
//! │  db (EntryStore)     verification (TokenVerifier)        │
//! │  SQLite/rusqlite     reCAPTCHA siteverify/reqwest        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`db`] | `Clipboards` 表的建表迁移与增删改查，乐观并发 |
//! | [`verification`] | reCAPTCHA token 校验，失败统一折叠为 `false` |
//! | [`service`] | 五个操作的编排，创建前的 token 校验 |
//! | [`settings`] | JSON 设置文件 + 环境变量覆盖 |
//! | [`web`] | HTTP 路由、状态码映射、优雅退出 |

pub mod error;
pub mod db;
pub mod service;
pub mod settings;
pub mod verification;
pub mod web;
