// Licensed under the Apache-2.0 license

pub mod gdb_state;
pub mod gdb_target;
