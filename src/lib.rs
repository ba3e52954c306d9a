//! forkshim - i386 `int 0x80` System Call Shim
//!
//! A user-space layer over four kernel services (`exit`, `write`, `fork`,
//! `sleep`) and a demonstration that forks a small tree of processes.
//!
//! # Layers
//! - [`syscall`]: encodes calls into registers and traps through a [`syscall::Gate`]
//! - [`process`]: fork-driven programs written as resumable state machines
//! - [`sim`]: a host-side kernel that decodes the same frames (feature `sim`)
//!
//! # Targets
//! - Bare i386 (`target_os = "none"`): programs trap into the real kernel via
//!   [`rt::start`]. Build with `--no-default-features`.
//! - Host: the binaries run the same programs under [`sim::Machine`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(feature = "sim")]
extern crate alloc;

pub mod config;
pub mod logger;
pub mod process;
pub mod syscall;

#[cfg(feature = "sim")]
pub mod sim;

#[cfg(all(target_os = "none", target_arch = "x86"))]
pub mod rt;
