//! Fixed-width scalar and math type vocabulary shared by every stitcher crate
//!
//! The vector, quaternion, and matrix types are glam's single precision types.
//! Widths are checked at compile time so a consumer relying on binary layout
//! (serialization, GPU upload) fails to build rather than misbehave.

#![allow(non_camel_case_types)]

use core::mem::size_of;

pub use core::primitive::{f32, f64, u16, u32, u64, u8};
pub use glam::{DMat2, DVec2, Mat4, Quat, Vec2, Vec3, Vec4};

/// Platform `unsigned int`
pub type uint = u32;

pub type s8 = i8;
pub type s16 = i16;
pub type s32 = i32;
pub type s64 = i64;

const _: () = assert!(size_of::<uint>() == 4);
const _: () = assert!(size_of::<u8>() == 1);
const _: () = assert!(size_of::<u16>() == 2);
const _: () = assert!(size_of::<u32>() == 4);
const _: () = assert!(size_of::<u64>() == 8);
const _: () = assert!(size_of::<s8>() == 1);
const _: () = assert!(size_of::<s16>() == 2);
const _: () = assert!(size_of::<s32>() == 4);
const _: () = assert!(size_of::<s64>() == 8);
const _: () = assert!(size_of::<f32>() == 4);
const _: () = assert!(size_of::<f64>() == 8);

const _: () = assert!(size_of::<Vec2>() == 2 * size_of::<f32>());
const _: () = assert!(size_of::<Vec3>() == 3 * size_of::<f32>());
const _: () = assert!(size_of::<Vec4>() == 4 * size_of::<f32>());
const _: () = assert!(size_of::<Quat>() == 4 * size_of::<f32>());
const _: () = assert!(size_of::<Mat4>() == 16 * size_of::<f32>());
const _: () = assert!(size_of::<DVec2>() == 2 * size_of::<f64>());
const _: () = assert!(size_of::<DMat2>() == 4 * size_of::<f64>());
