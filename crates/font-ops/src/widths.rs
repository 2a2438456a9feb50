//! Advance width inspection and glyph width changes.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use log::debug;
use read_fonts::{
    FontRef, TableProvider,
    tables::{glyf as read_glyf, glyf::CurvePoint},
    types::GlyphId,
};
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{
        glyf::{
            Bbox, Component, ComponentFlags, CompositeGlyph, Contour, GlyfLocaBuilder, Glyph,
            SimpleGlyph, Transform,
        },
        head::Head,
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
    },
};

use crate::rewrite_font;

/// Advance width of every glyph, indexed by glyph ID.
pub fn advance_widths(data: &[u8]) -> Result<Vec<u16>> {
    let font = FontRef::new(data)?;
    let num_glyphs = font.maxp()?.num_glyphs();
    let hmtx = font.hmtx()?;
    Ok((0..num_glyphs as u32)
        .map(|gid| hmtx.advance(GlyphId::new(gid)).unwrap_or(0))
        .collect())
}

/// Fail if any glyph has an advance width outside `allowed`.
pub fn verify_advance_widths(data: &[u8], allowed: &[u16]) -> Result<()> {
    let mut unexpected: BTreeMap<u16, Vec<usize>> = BTreeMap::new();
    for (gid, width) in advance_widths(data)?.into_iter().enumerate() {
        if !allowed.contains(&width) {
            unexpected.entry(width).or_default().push(gid);
        }
    }
    if unexpected.is_empty() {
        return Ok(());
    }
    let summary: Vec<String> = unexpected
        .iter()
        .map(|(width, gids)| {
            let sample: Vec<String> = gids.iter().take(5).map(|g| format!("gid{g}")).collect();
            format!("{width} ({} glyphs, e.g. {})", gids.len(), sample.join(", "))
        })
        .collect();
    bail!(
        "unexpected advance widths (allowed {allowed:?}): {}",
        summary.join("; ")
    )
}

/// Result of [`change_glyph_width`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphWidthChange {
    /// Glyphs whose advance was changed.
    pub changed: usize,
    /// Of those, glyphs whose outline was shifted.
    pub shifted: usize,
}

/// Change every glyph advancing `from` units to advance `to` units.
///
/// Simple outlines are shifted by half the difference so they stay centred,
/// and their left side bearing follows. Composite glyphs keep their component
/// offsets since the referenced outlines move themselves. The metrics are
/// rewritten with one long metric per glyph.
pub fn change_glyph_width(data: &[u8], from: u16, to: u16) -> Result<(Vec<u8>, GlyphWidthChange)> {
    let delta = ((to as f32 - from as f32) / 2.0).round() as i16;
    let mut change = GlyphWidthChange::default();

    let output = rewrite_font(data, |font, builder| {
        let num_glyphs = font.maxp()?.num_glyphs() as u32;
        let hmtx = font.hmtx()?;
        let glyf = font.glyf()?;
        let loca = font.loca(None)?;

        let mut glyf_builder = GlyfLocaBuilder::new();
        let mut metrics = Vec::with_capacity(num_glyphs as usize);

        for gid in 0..num_glyphs {
            let glyph_id = GlyphId::new(gid);
            let advance = hmtx.advance(glyph_id).unwrap_or(0);
            let lsb = hmtx.side_bearing(glyph_id).unwrap_or(0);
            let source = loca.get_glyf(glyph_id, &glyf)?;
            let matched = advance == from;

            let glyph = match source {
                Some(read_glyf::Glyph::Simple(simple)) if matched => {
                    change.shifted += 1;
                    Glyph::Simple(translate_simple_glyph(&simple, delta))
                }
                Some(read_glyf::Glyph::Simple(simple)) => {
                    Glyph::Simple(translate_simple_glyph(&simple, 0))
                }
                Some(read_glyf::Glyph::Composite(composite)) => copy_composite_glyph(&composite),
                None => Glyph::Empty,
            };
            glyf_builder.add_glyph(&glyph)?;

            let metric = if !matched {
                LongMetric { advance, side_bearing: lsb }
            } else {
                change.changed += 1;
                let side_bearing = if matches!(glyph, Glyph::Empty) { lsb } else { lsb + delta };
                LongMetric { advance: to, side_bearing }
            };
            metrics.push(metric);
        }

        let (new_glyf, new_loca, loca_format) = glyf_builder.build();
        builder.add_table(&new_glyf)?;
        builder.add_table(&new_loca)?;

        let mut head: Head = font.head()?.to_owned_table();
        head.index_to_loc_format = loca_format as i16;
        builder.add_table(&head)?;

        let mut hhea: Hhea = font.hhea()?.to_owned_table();
        hhea.advance_width_max = metrics.iter().map(|m| m.advance).max().unwrap_or(to).into();
        hhea.number_of_h_metrics = metrics.len() as u16;
        builder.add_table(&hhea)?;

        builder.add_table(&Hmtx::new(metrics, Vec::new()))?;
        Ok(())
    })?;

    debug!(
        "Changed {} glyph widths {from} -> {to} ({} outlines shifted)",
        change.changed, change.shifted
    );
    Ok((output, change))
}

fn translate_simple_glyph(glyph: &read_glyf::SimpleGlyph, dx: i16) -> SimpleGlyph {
    let end_pts: Vec<usize> = glyph
        .end_pts_of_contours()
        .iter()
        .map(|e| e.get() as usize)
        .collect();
    let points: Vec<CurvePoint> = glyph.points().collect();

    let mut contours = Vec::with_capacity(end_pts.len());
    let mut start = 0usize;
    for end in end_pts {
        let shifted: Vec<CurvePoint> = points[start..=end]
            .iter()
            .map(|p| CurvePoint::new(p.x + dx, p.y, p.on_curve))
            .collect();
        contours.push(Contour::from(shifted));
        start = end + 1;
    }

    SimpleGlyph {
        bbox: Bbox {
            x_min: glyph.x_min() + dx,
            y_min: glyph.y_min(),
            x_max: glyph.x_max() + dx,
            y_max: glyph.y_max(),
        },
        contours,
        instructions: glyph.instructions().to_vec(),
    }
}

fn copy_composite_glyph(glyph: &read_glyf::CompositeGlyph) -> Glyph {
    use read_glyf::CompositeGlyphFlags as F;

    let bbox = Bbox {
        x_min: glyph.x_min(),
        y_min: glyph.y_min(),
        x_max: glyph.x_max(),
        y_max: glyph.y_max(),
    };
    let mut components = glyph.components().map(|c| Component {
        glyph: c.glyph,
        anchor: c.anchor,
        flags: ComponentFlags {
            round_xy_to_grid: c.flags.contains(F::ROUND_XY_TO_GRID),
            use_my_metrics: c.flags.contains(F::USE_MY_METRICS),
            scaled_component_offset: c.flags.contains(F::SCALED_COMPONENT_OFFSET),
            unscaled_component_offset: c.flags.contains(F::UNSCALED_COMPONENT_OFFSET),
            overlap_compound: c.flags.contains(F::OVERLAP_COMPOUND),
        },
        transform: Transform {
            xx: c.transform.xx,
            yx: c.transform.yx,
            xy: c.transform.xy,
            yy: c.transform.yy,
        },
    });

    let mut composite = match components.next() {
        Some(first) => CompositeGlyph::new(first, bbox),
        None => return Glyph::Empty,
    };
    for component in components {
        composite.add_component(component, bbox);
    }
    Glyph::Composite(composite)
}
