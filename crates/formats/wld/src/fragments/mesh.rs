use std::ops::Range;

use crate::cursor::{Cursor, Writer};
use crate::error::{Error, Result};
use crate::version::WldVersion;

/// One polygon-texture run: `count` consecutive triangles drawn with the
/// sprite in texture-list slot `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolygonRun {
    pub count: u16,
    pub slot: u16,
}

/// Triangles of a mesh that share one texture slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyGroup {
    pub slot: u16,
    /// Range into [`Mesh::triangles`].
    pub triangles: Range<usize>,
}

/// Mesh (fragment 0x36).
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub flags: u32,
    /// Fragment references. The first one names the material (texture list).
    pub references: [i32; 4],
    pub center: [f32; 3],
    pub params2: [u32; 3],
    pub max_distance: f32,
    pub min: [f32; 3],
    pub max: [f32; 3],
    /// Count of the vertex-texture entries. Stored, never interpreted.
    pub vertex_tex_count: u16,
    pub size9: u16,
    /// Vertex positions are `i16 / 2^scale_exponent`.
    pub scale_exponent: u16,
    pub vertices: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    /// Packed RGBA exactly as stored.
    pub colors: Vec<u32>,
    /// Vertex indices. The per-polygon flag word is not retained.
    pub triangles: Vec<[u16; 3]>,
    /// The `size6 * 4` bytes between the triangle list and the runs.
    pub opaque: Vec<u8>,
    pub polygon_runs: Vec<PolygonRun>,
}

impl Mesh {
    pub fn parse(c: &mut Cursor<'_>, version: WldVersion) -> Result<Self> {
        let flags = c.read_u32()?;
        let references = [c.read_i32()?, c.read_i32()?, c.read_i32()?, c.read_i32()?];
        let center = read_vec3(c)?;
        let params2 = [c.read_u32()?, c.read_u32()?, c.read_u32()?];
        let max_distance = c.read_f32()?;
        let min = read_vec3(c)?;
        let max = read_vec3(c)?;

        let vertex_count = c.read_u16()? as usize;
        let uv_count = c.read_u16()? as usize;
        let normal_count = c.read_u16()? as usize;
        let color_count = c.read_u16()? as usize;
        let triangle_count = c.read_u16()? as usize;
        let size6 = c.read_u16()? as usize;
        let run_count = c.read_u16()? as usize;
        let vertex_tex_count = c.read_u16()?;
        let size9 = c.read_u16()?;
        let scale_exponent = c.read_u16()?;
        let scale = scale_for(scale_exponent);

        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let x = c.read_i16()?;
            let y = c.read_i16()?;
            let z = c.read_i16()?;
            vertices.push([x as f32 * scale, y as f32 * scale, z as f32 * scale]);
        }

        let mut uvs = Vec::with_capacity(uv_count);
        for _ in 0..uv_count {
            let uv = if version.has_float_uvs() {
                let u = c.read_f32()?;
                let v = c.read_f32()?;
                [u, -v]
            } else {
                let u = c.read_i16()?;
                let v = c.read_i16()?;
                [u as f32 / 256.0, v as f32 / 256.0]
            };
            uvs.push(uv);
        }

        let mut normals = Vec::with_capacity(normal_count);
        for _ in 0..normal_count {
            let x = c.read_i8()?;
            let y = c.read_i8()?;
            let z = c.read_i8()?;
            normals.push([x as f32 / 127.0, y as f32 / 127.0, z as f32 / 127.0]);
        }

        let mut colors = Vec::with_capacity(color_count);
        for _ in 0..color_count {
            colors.push(c.read_u32()?);
        }

        let mut triangles = Vec::with_capacity(triangle_count);
        for _ in 0..triangle_count {
            let _flag = c.read_u16()?;
            triangles.push([c.read_u16()?, c.read_u16()?, c.read_u16()?]);
        }

        let opaque = c.read_bytes(size6 * 4)?.to_vec();

        let mut polygon_runs = Vec::with_capacity(run_count);
        for _ in 0..run_count {
            let count = c.read_u16()?;
            let slot = c.read_u16()?;
            polygon_runs.push(PolygonRun { count, slot });
        }

        Ok(Self {
            flags,
            references,
            center,
            params2,
            max_distance,
            min,
            max,
            vertex_tex_count,
            size9,
            scale_exponent,
            vertices,
            uvs,
            normals,
            colors,
            triangles,
            opaque,
            polygon_runs,
        })
    }

    /// Reference to the texture list this mesh draws from.
    pub fn material_list(&self) -> i32 {
        self.references[0]
    }

    /// Vertex position scale, `1 / 2^scale_exponent`.
    pub fn scale(&self) -> f32 {
        scale_for(self.scale_exponent)
    }

    /// Number of triangles covered by the polygon runs.
    pub fn covered_triangles(&self) -> usize {
        self.polygon_runs.iter().map(|r| r.count as usize).sum()
    }

    /// Check that the polygon runs cover exactly the triangle list.
    pub fn validate_runs(&self, id: usize) -> Result<()> {
        let covered = self.covered_triangles();
        if covered != self.triangles.len() {
            return Err(Error::PolygonRunMismatch {
                id,
                covered,
                decoded: self.triangles.len(),
            });
        }
        Ok(())
    }

    /// Split the triangle list into consecutive per-slot groups.
    ///
    /// Runs reaching past the triangle list are clipped; empty runs are
    /// skipped.
    pub fn poly_groups(&self) -> Vec<PolyGroup> {
        let total = self.triangles.len();
        let mut start = 0;
        let mut groups = Vec::with_capacity(self.polygon_runs.len());
        for run in &self.polygon_runs {
            let end = (start + run.count as usize).min(total);
            if end > start {
                groups.push(PolyGroup {
                    slot: run.slot,
                    triangles: start..end,
                });
            }
            start = end;
        }
        groups
    }

    /// Encode the fragment body, quantising positions, UVs and normals back
    /// to their stored widths.
    pub fn write(&self, w: &mut Writer, version: WldVersion) {
        w.write_u32(self.flags);
        for r in self.references {
            w.write_i32(r);
        }
        write_vec3(w, self.center);
        for p in self.params2 {
            w.write_u32(p);
        }
        w.write_f32(self.max_distance);
        write_vec3(w, self.min);
        write_vec3(w, self.max);

        w.write_u16(self.vertices.len() as u16);
        w.write_u16(self.uvs.len() as u16);
        w.write_u16(self.normals.len() as u16);
        w.write_u16(self.colors.len() as u16);
        w.write_u16(self.triangles.len() as u16);
        w.write_u16((self.opaque.len() / 4) as u16);
        w.write_u16(self.polygon_runs.len() as u16);
        w.write_u16(self.vertex_tex_count);
        w.write_u16(self.size9);
        w.write_u16(self.scale_exponent);

        let inv_scale = 1.0 / self.scale();
        for v in &self.vertices {
            for x in v {
                w.write_i16((x * inv_scale).round() as i16);
            }
        }
        for [u, v] in &self.uvs {
            if version.has_float_uvs() {
                w.write_f32(*u);
                w.write_f32(-v);
            } else {
                w.write_i16((u * 256.0).round() as i16);
                w.write_i16((v * 256.0).round() as i16);
            }
        }
        for n in &self.normals {
            for x in n {
                w.write_i8((x * 127.0).round() as i8);
            }
        }
        for color in &self.colors {
            w.write_u32(*color);
        }
        for t in &self.triangles {
            w.write_u16(0);
            for i in t {
                w.write_u16(*i);
            }
        }
        let padded = self.opaque.len() / 4 * 4;
        w.write_bytes(&self.opaque[..padded]);
        for run in &self.polygon_runs {
            w.write_u16(run.count);
            w.write_u16(run.slot);
        }
    }
}

fn scale_for(exponent: u16) -> f32 {
    2f32.powi(-i32::from(exponent))
}

fn read_vec3(c: &mut Cursor<'_>) -> Result<[f32; 3]> {
    Ok([c.read_f32()?, c.read_f32()?, c.read_f32()?])
}

fn write_vec3(w: &mut Writer, v: [f32; 3]) {
    for x in v {
        w.write_f32(x);
    }
}
