//! Persisted form of typed arrays and image data.
//!
//! AoS: `<u8 type_code><u64 n_tuples><u8 n_components><raw little-endian values>`.
//! SoA: `<u8 type_code><u64 n_tuples><u8 n_components>` then per component
//! `<f64 scale><n_tuples raw values>`; an unscaled component stores `1.0`.
//!
//! Image data (`.vxi`) wraps named arrays with a small header, see [`write_image`].

use std::sync::Arc;

use crate::array::aos::AosArray;
use crate::array::data_array::{DataArray, Layout};
use crate::array::scalar::{Scalar, ScalarType};
use crate::array::soa::SoaArray;
use crate::dataset::{FieldData, ImageData};
use crate::foundation::core::Extent;
use crate::foundation::error::{VoxflowError, VoxflowResult};

const IMAGE_MAGIC: &[u8; 4] = b"VXI1";

/// Widest tuple the one-byte component field can describe.
pub const MAX_PERSISTED_COMPONENTS: usize = u8::MAX as usize;

fn write_header(out: &mut Vec<u8>, ty: ScalarType, tuples: usize, comps: usize) -> VoxflowResult<()> {
    let comps = u8::try_from(comps).map_err(|_| {
        VoxflowError::bad_input(format!(
            "cannot persist {comps} components per tuple (at most {MAX_PERSISTED_COMPONENTS})"
        ))
    })?;
    out.push(ty.code());
    out.extend_from_slice(&(tuples as u64).to_le_bytes());
    out.push(comps);
    Ok(())
}

pub(crate) fn write_aos<T: Scalar>(a: &AosArray<T>, out: &mut Vec<u8>) -> VoxflowResult<()> {
    write_header(out, T::TYPE, a.len(), a.components())?;
    out.reserve(a.as_slice().len() * T::TYPE.size());
    for &v in a.as_slice() {
        v.write_le(out);
    }
    Ok(())
}

pub(crate) fn write_soa<T: Scalar>(a: &SoaArray<T>, out: &mut Vec<u8>) -> VoxflowResult<()> {
    write_header(out, T::TYPE, a.len(), a.components())?;
    for k in 0..a.components() {
        out.extend_from_slice(&a.scale(k).unwrap_or(1.0).to_le_bytes());
        for &v in a.component_slice(k) {
            v.write_le(out);
        }
    }
    Ok(())
}

/// Serialise an array in its layout's persisted form.
///
/// Fails with `BadInput` when the array has more than [`MAX_PERSISTED_COMPONENTS`]
/// components.
pub fn write_array(a: &dyn DataArray) -> VoxflowResult<Vec<u8>> {
    let mut out = Vec::new();
    a.write_to(&mut out)?;
    Ok(out)
}

/// Little-endian reader over a byte slice.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn take(&mut self, n: usize) -> VoxflowResult<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.buf.len()).ok_or_else(|| {
            VoxflowError::serde(format!(
                "truncated input: need {n} bytes at offset {}, have {}",
                self.pos,
                self.buf.len() - self.pos
            ))
        })?;
        let s = &self.buf[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    pub(crate) fn u8(&mut self) -> VoxflowResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u32(&mut self) -> VoxflowResult<u32> {
        let mut b = [0_u8; 4];
        b.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(b))
    }

    pub(crate) fn i32(&mut self) -> VoxflowResult<i32> {
        Ok(self.u32()? as i32)
    }

    pub(crate) fn u64(&mut self) -> VoxflowResult<u64> {
        let mut b = [0_u8; 8];
        b.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(b))
    }

    pub(crate) fn f64(&mut self) -> VoxflowResult<f64> {
        Ok(f64::from_bits(self.u64()?))
    }

    pub(crate) fn string(&mut self) -> VoxflowResult<String> {
        let n = self.u32()? as usize;
        String::from_utf8(self.take(n)?.to_vec())
            .map_err(|e| VoxflowError::serde(format!("invalid utf-8 name: {e}")))
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

fn read_values<T: Scalar>(r: &mut Reader<'_>, n: usize) -> VoxflowResult<Vec<T>> {
    let size = T::TYPE.size();
    let bytes = r.take(n.checked_mul(size).ok_or_else(|| {
        VoxflowError::serde(format!("{n} values overflow the address space"))
    })?)?;
    Ok(bytes.chunks_exact(size).map(T::read_le).collect())
}

fn read_aos_typed<T: Scalar>(r: &mut Reader<'_>, tuples: usize, comps: usize) -> VoxflowResult<Box<dyn DataArray>> {
    let values = read_values::<T>(r, tuples.saturating_mul(comps))?;
    Ok(Box::new(AosArray::from_vec(comps, values)?))
}

fn read_soa_typed<T: Scalar>(r: &mut Reader<'_>, tuples: usize, comps: usize) -> VoxflowResult<Box<dyn DataArray>> {
    let mut buffers = Vec::with_capacity(comps);
    let mut scales = Vec::with_capacity(comps);
    for _ in 0..comps {
        let s = r.f64()?;
        scales.push((s != 1.0).then_some(s));
        buffers.push(read_values::<T>(r, tuples)?);
    }
    let mut a = SoaArray::from_buffers(buffers)?;
    for (k, s) in scales.into_iter().enumerate() {
        a.set_scale(k, s)?;
    }
    Ok(Box::new(a))
}

pub(crate) fn read_array_from(r: &mut Reader<'_>, layout: Layout) -> VoxflowResult<Box<dyn DataArray>> {
    let ty = ScalarType::from_code(r.u8()?)?;
    let tuples = usize::try_from(r.u64()?)
        .map_err(|_| VoxflowError::serde("tuple count exceeds the address space"))?;
    let comps = r.u8()? as usize;
    if comps == 0 {
        return Err(VoxflowError::serde("persisted array has zero components"));
    }
    let want = tuples
        .checked_mul(comps)
        .and_then(|v| v.checked_mul(ty.size()))
        .ok_or_else(|| VoxflowError::serde("array size overflows the address space"))?;
    if want > r.remaining() {
        return Err(VoxflowError::serde(format!(
            "truncated array: {want} value bytes declared, {} available",
            r.remaining()
        )));
    }
    match layout {
        Layout::Aos => crate::dispatch_scalar!(ty, T => read_aos_typed::<T>(r, tuples, comps)),
        Layout::Soa => crate::dispatch_scalar!(ty, T => read_soa_typed::<T>(r, tuples, comps)),
    }
}

/// Decode an array persisted with [`write_array`]; the layout is not part of the bytes.
pub fn read_array(bytes: &[u8], layout: Layout) -> VoxflowResult<Box<dyn DataArray>> {
    let mut r = Reader::new(bytes);
    let a = read_array_from(&mut r, layout)?;
    if r.remaining() != 0 {
        return Err(VoxflowError::serde(format!(
            "{} trailing bytes after array",
            r.remaining()
        )));
    }
    Ok(a)
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn write_fields(out: &mut Vec<u8>, fd: &FieldData) -> VoxflowResult<()> {
    out.extend_from_slice(&(fd.len() as u32).to_le_bytes());
    for (name, a) in fd.iter() {
        write_string(out, name);
        out.push(a.layout().tag());
        a.write_to(out)?;
    }
    write_string(out, fd.active_scalars_name().unwrap_or(""));
    Ok(())
}

fn read_fields(r: &mut Reader<'_>, fd: &mut FieldData) -> VoxflowResult<()> {
    let n = r.u32()?;
    for _ in 0..n {
        let name = r.string()?;
        let layout = Layout::from_tag(r.u8()?)?;
        let mut a = read_array_from(r, layout)?;
        a.set_name(&name);
        fd.insert(Arc::from(a))?;
    }
    let active = r.string()?;
    if !active.is_empty() {
        fd.set_active_scalars(&active)?;
    }
    Ok(())
}

/// Serialise image data: extent, origin, spacing, point arrays, cell arrays.
pub fn write_image(img: &ImageData) -> VoxflowResult<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(IMAGE_MAGIC);
    for v in img.extent().0 {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for v in img.origin().into_iter().chain(img.spacing()) {
        out.extend_from_slice(&v.to_le_bytes());
    }
    write_fields(&mut out, img.point_data())?;
    write_fields(&mut out, img.cell_data())?;
    Ok(out)
}

/// Decode image data written by [`write_image`].
pub fn read_image(bytes: &[u8]) -> VoxflowResult<ImageData> {
    let mut r = Reader::new(bytes);
    if r.take(4)? != IMAGE_MAGIC {
        return Err(VoxflowError::serde("not a voxflow image (bad magic)"));
    }
    let mut e = [0_i32; 6];
    for v in &mut e {
        *v = r.i32()?;
    }
    let mut g = [0.0_f64; 6];
    for v in &mut g {
        *v = r.f64()?;
    }
    let mut img = ImageData::new(Extent(e));
    img.set_origin([g[0], g[1], g[2]]);
    img.set_spacing([g[3], g[4], g[5]]);
    read_fields(&mut r, img.point_data_mut())?;
    read_fields(&mut r, img.cell_data_mut())?;
    if r.remaining() != 0 {
        return Err(VoxflowError::serde(format!(
            "{} trailing bytes after image",
            r.remaining()
        )));
    }
    Ok(img)
}

#[cfg(test)]
#[path = "../../tests/unit/array/persist.rs"]
mod tests;
