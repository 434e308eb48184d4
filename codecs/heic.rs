// HEIC/HEIF decoding via libheif
// Provides decode support for Apple HEIC and HEIF images plus JPEG re-encoding
// so phone captures can be handed out in a portable format

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;
use std::ptr;
use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, RgbImage, RgbaImage};

// Opaque libheif types
#[repr(C)]
pub struct HeifContext {
    _private: [u8; 0],
}

#[repr(C)]
pub struct HeifImageHandle {
    _private: [u8; 0],
}

#[repr(C)]
pub struct HeifImage {
    _private: [u8; 0],
}

#[repr(C)]
pub struct HeifError {
    pub code: c_int,
    pub subcode: c_int,
    pub message: *const c_char,
}

// Colorspace and chroma
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeifColorspace {
    Undefined = 99,
    YCbCr = 0,
    RGB = 1,
    Monochrome = 2,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeifChroma {
    Undefined = 99,
    Monochrome = 0,
    InterleavedRGB = 10,
    InterleavedRGBA = 11,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeifChannel {
    Y = 0,
    Alpha = 6,
    Interleaved = 10,
}

// FFI declarations for libheif (decoding only)
#[cfg(feature = "heif")]
extern "C" {
    fn heif_context_alloc() -> *mut HeifContext;
    fn heif_context_free(ctx: *mut HeifContext);
    fn heif_context_read_from_file(
        ctx: *mut HeifContext,
        filename: *const c_char,
        options: *const c_void,
    ) -> HeifError;
    fn heif_context_get_primary_image_handle(
        ctx: *mut HeifContext,
        handle: *mut *mut HeifImageHandle,
    ) -> HeifError;
    fn heif_image_handle_release(handle: *mut HeifImageHandle);
    fn heif_image_handle_get_width(handle: *const HeifImageHandle) -> c_int;
    fn heif_image_handle_get_height(handle: *const HeifImageHandle) -> c_int;
    fn heif_image_handle_has_alpha_channel(handle: *const HeifImageHandle) -> c_int;
    // Null decoding options keep libheif's default of applying irot/imir transforms
    fn heif_decode_image(
        handle: *const HeifImageHandle,
        out_img: *mut *mut HeifImage,
        colorspace: HeifColorspace,
        chroma: HeifChroma,
        options: *const c_void,
    ) -> HeifError;
    fn heif_image_release(img: *mut HeifImage);
    fn heif_image_get_width(img: *const HeifImage, channel: HeifChannel) -> c_int;
    fn heif_image_get_height(img: *const HeifImage, channel: HeifChannel) -> c_int;
    fn heif_image_get_plane_readonly(
        img: *const HeifImage,
        channel: HeifChannel,
        out_stride: *mut c_int,
    ) -> *const u8;
}

// Stub implementations when libheif is not available
#[cfg(not(feature = "heif"))]
mod stubs {
    use super::*;

    fn unavailable() -> HeifError {
        HeifError { code: -1, subcode: 0, message: ptr::null() }
    }

    pub unsafe fn heif_context_alloc() -> *mut HeifContext { ptr::null_mut() }
    pub unsafe fn heif_context_free(_ctx: *mut HeifContext) {}
    pub unsafe fn heif_context_read_from_file(
        _ctx: *mut HeifContext, _filename: *const c_char, _options: *const c_void,
    ) -> HeifError { unavailable() }
    pub unsafe fn heif_context_get_primary_image_handle(
        _ctx: *mut HeifContext, _handle: *mut *mut HeifImageHandle,
    ) -> HeifError { unavailable() }
    pub unsafe fn heif_image_handle_release(_handle: *mut HeifImageHandle) {}
    pub unsafe fn heif_image_handle_get_width(_handle: *const HeifImageHandle) -> c_int { 0 }
    pub unsafe fn heif_image_handle_get_height(_handle: *const HeifImageHandle) -> c_int { 0 }
    pub unsafe fn heif_image_handle_has_alpha_channel(_handle: *const HeifImageHandle) -> c_int { 0 }
    pub unsafe fn heif_decode_image(
        _handle: *const HeifImageHandle, _out_img: *mut *mut HeifImage,
        _colorspace: HeifColorspace, _chroma: HeifChroma, _options: *const c_void,
    ) -> HeifError { unavailable() }
    pub unsafe fn heif_image_release(_img: *mut HeifImage) {}
    pub unsafe fn heif_image_get_width(_img: *const HeifImage, _channel: HeifChannel) -> c_int { 0 }
    pub unsafe fn heif_image_get_height(_img: *const HeifImage, _channel: HeifChannel) -> c_int { 0 }
    pub unsafe fn heif_image_get_plane_readonly(
        _img: *const HeifImage, _channel: HeifChannel, _out_stride: *mut c_int,
    ) -> *const u8 { ptr::null() }
}

#[cfg(not(feature = "heif"))]
use stubs::*;

/// Decoded HEIC image data
#[derive(Debug)]
pub struct DecodedHeicImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub has_alpha: bool,
}

impl DecodedHeicImage {
    /// Wrap the interleaved pixels into an `image` buffer
    pub fn into_dynamic_image(self) -> Result<DynamicImage> {
        let (width, height) = (self.width, self.height);
        if self.has_alpha {
            RgbaImage::from_raw(width, height, self.data)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(|| anyhow!("Decoded RGBA buffer does not match {}x{}", width, height))
        } else {
            RgbImage::from_raw(width, height, self.data)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| anyhow!("Decoded RGB buffer does not match {}x{}", width, height))
        }
    }
}

/// HEIC decoder using libheif
pub struct HeicCodec {
    ctx: *mut HeifContext,
}

impl HeicCodec {
    /// Create a new HEIC codec
    pub fn new() -> Result<Self> {
        let ctx = unsafe { heif_context_alloc() };
        if ctx.is_null() {
            return Err(anyhow!("Failed to create HEIF context - libheif may not be available"));
        }
        Ok(Self { ctx })
    }

    /// Decode the primary image of a HEIC/HEIF file to RGB/RGBA data
    pub fn decode_file(&self, path: &Path) -> Result<DecodedHeicImage> {
        let path_str = path.to_string_lossy();
        let path_cstr = CString::new(path_str.as_ref())?;

        unsafe {
            let err = heif_context_read_from_file(self.ctx, path_cstr.as_ptr(), ptr::null());
            if err.code != 0 {
                let msg = Self::error_message(&err);
                return Err(anyhow!("Failed to read HEIC file: {}", msg));
            }

            let mut handle: *mut HeifImageHandle = ptr::null_mut();
            let err = heif_context_get_primary_image_handle(self.ctx, &mut handle);
            if err.code != 0 || handle.is_null() {
                let msg = Self::error_message(&err);
                return Err(anyhow!("Failed to get image handle: {}", msg));
            }

            let has_alpha = heif_image_handle_has_alpha_channel(handle) != 0;
            let chroma = if has_alpha {
                HeifChroma::InterleavedRGBA
            } else {
                HeifChroma::InterleavedRGB
            };

            let mut img: *mut HeifImage = ptr::null_mut();
            let err = heif_decode_image(handle, &mut img, HeifColorspace::RGB, chroma, ptr::null());
            if err.code != 0 || img.is_null() {
                heif_image_handle_release(handle);
                let msg = Self::error_message(&err);
                return Err(anyhow!("Failed to decode image: {}", msg));
            }

            // Rotation may have swapped the handle's dimensions, read them from the decoded plane
            let width = heif_image_get_width(img, HeifChannel::Interleaved).max(0) as u32;
            let height = heif_image_get_height(img, HeifChannel::Interleaved).max(0) as u32;
            if width == 0 || height == 0 {
                heif_image_release(img);
                heif_image_handle_release(handle);
                return Err(anyhow!(
                    "Decoded image has no pixels (handle reported {}x{})",
                    heif_image_handle_get_width(handle),
                    heif_image_handle_get_height(handle)
                ));
            }

            let mut stride: c_int = 0;
            let data_ptr = heif_image_get_plane_readonly(img, HeifChannel::Interleaved, &mut stride);
            if data_ptr.is_null() {
                heif_image_release(img);
                heif_image_handle_release(handle);
                return Err(anyhow!("Failed to get image data"));
            }

            let bytes_per_pixel = if has_alpha { 4 } else { 3 };
            let row_bytes = width as usize * bytes_per_pixel;
            let mut data = Vec::with_capacity(height as usize * row_bytes);

            for y in 0..height as isize {
                let row_ptr = data_ptr.offset(y * stride as isize);
                let row = std::slice::from_raw_parts(row_ptr, row_bytes);
                data.extend_from_slice(row);
            }

            heif_image_release(img);
            heif_image_handle_release(handle);

            Ok(DecodedHeicImage { width, height, data, has_alpha })
        }
    }

    fn error_message(err: &HeifError) -> String {
        if err.message.is_null() {
            format!("Error code: {}", err.code)
        } else {
            unsafe { CStr::from_ptr(err.message).to_string_lossy().into_owned() }
        }
    }
}

impl Drop for HeicCodec {
    fn drop(&mut self) {
        if !self.ctx.is_null() {
            unsafe { heif_context_free(self.ctx); }
        }
    }
}

unsafe impl Send for HeicCodec {}

/// Decode a HEIC file to an `image` buffer (convenience function)
pub fn decode_heic_image(path: &Path) -> Result<DynamicImage> {
    let codec = HeicCodec::new()?;
    codec.decode_file(path)?.into_dynamic_image()
}

/// Encode an image as baseline JPEG bytes. Alpha is dropped since JPEG has none.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .context("Failed to encode JPEG")?;
    Ok(out)
}
