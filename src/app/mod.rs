// SPDX-License-Identifier: Apache-2.0 OR MIT
pub mod args;
pub mod extract;
pub mod extract_file;
pub mod list;
pub mod stat;
pub mod verify;
