//! Headless wgpu surfaces for glint
//!
//! Each test case gets its own device rendering into an offscreen
//! `Rgba8Unorm` texture. Test bodies record work with
//! [`WgpuSurface::encode`]; readback copies the texture into a mapped buffer.
//!
//! Surface profiles select wgpu backends:
//!
//! | profile   | backends              |
//! |-----------|-----------------------|
//! | `primary` | Vulkan, Metal, DX12, WebGPU |
//! | `vulkan`  | Vulkan                |
//! | `metal`   | Metal                 |
//! | `dx12`    | DX12                  |
//! | `gl`      | OpenGL / GLES         |
//! | `all`     | every backend         |

mod provider;
mod surface;

pub use provider::{backends_for_profile, WgpuProvider, PROFILES};
pub use surface::WgpuSurface;
