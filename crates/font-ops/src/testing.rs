//! Synthesized fonts for unit tests.

use font_types::{FWord, Fixed, LongDateTime, UfWord, Version16Dot16};
use read_fonts::{tables::glyf::CurvePoint, types::NameId};
use write_fonts::{
    FontBuilder,
    tables::{
        glyf::{Bbox, Contour, GlyfLocaBuilder, Glyph, SimpleGlyph},
        head::{Flags, Head, MacStyle},
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        loca::LocaFormat,
        maxp::Maxp,
        name::{Name, NameRecord},
        os2::Os2,
        post::Post,
    },
};

/// A glyph: `Some((x_min, x_max))` for a filled rectangle, `None` for empty.
pub struct TestGlyph {
    pub outline: Option<(i16, i16)>,
    pub advance: u16,
}

pub const fn glyph(outline: Option<(i16, i16)>, advance: u16) -> TestGlyph {
    TestGlyph { outline, advance }
}

/// `.notdef`, a Latin glyph, a CJK glyph and an empty full-width space.
///
/// Only the first three glyphs get long metrics, so the space inherits the
/// last advance (1200) through the short left-side-bearing array.
pub fn cjk_font() -> Vec<u8> {
    build_font(
        &[
            glyph(None, 600),
            glyph(Some((100, 500)), 600),
            glyph(Some((100, 1100)), 1200),
            glyph(None, 1200),
        ],
        3,
        &[(1, "Maple Mono"), (2, "Regular"), (6, "MapleMono-Regular")],
    )
}

pub fn build_font(glyphs: &[TestGlyph], long_metrics: usize, names: &[(u16, &str)]) -> Vec<u8> {
    let mut glyf_builder = GlyfLocaBuilder::new();
    let mut lsbs = Vec::new();
    for g in glyphs {
        let glyph = match g.outline {
            Some((x_min, x_max)) => {
                let points = vec![
                    CurvePoint::new(x_min, 0, true),
                    CurvePoint::new(x_min, 700, true),
                    CurvePoint::new(x_max, 700, true),
                    CurvePoint::new(x_max, 0, true),
                ];
                lsbs.push(x_min);
                Glyph::Simple(SimpleGlyph {
                    bbox: Bbox { x_min, y_min: 0, x_max, y_max: 700 },
                    contours: vec![Contour::from(points)],
                    instructions: vec![],
                })
            }
            None => {
                lsbs.push(0);
                Glyph::Empty
            }
        };
        glyf_builder.add_glyph(&glyph).unwrap();
    }
    let (glyf, loca, loca_format) = glyf_builder.build();

    let head = Head {
        font_revision: Fixed::from_f64(1.0),
        checksum_adjustment: 0,
        magic_number: 0x5F0F3CF5,
        flags: Flags::empty(),
        units_per_em: 1000,
        created: LongDateTime::new(0),
        modified: LongDateTime::new(0),
        x_min: 0,
        y_min: 0,
        x_max: 1100,
        y_max: 700,
        mac_style: MacStyle::empty(),
        lowest_rec_ppem: 8,
        font_direction_hint: 2,
        index_to_loc_format: match loca_format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        },
    };

    let max_advance = glyphs.iter().map(|g| g.advance).max().unwrap_or(0);
    let hhea = Hhea {
        ascender: FWord::new(700),
        descender: FWord::new(-200),
        line_gap: FWord::new(0),
        advance_width_max: UfWord::new(max_advance),
        min_left_side_bearing: FWord::new(0),
        min_right_side_bearing: FWord::new(0),
        x_max_extent: FWord::new(1100),
        caret_slope_rise: 1,
        caret_slope_run: 0,
        caret_offset: 0,
        number_of_h_metrics: long_metrics as u16,
    };

    let hmtx = Hmtx {
        h_metrics: glyphs[..long_metrics]
            .iter()
            .zip(&lsbs)
            .map(|(g, &lsb)| LongMetric { advance: g.advance, side_bearing: lsb })
            .collect(),
        left_side_bearings: lsbs[long_metrics..].to_vec(),
    };

    let maxp = Maxp {
        num_glyphs: glyphs.len() as u16,
        max_points: Some(4),
        max_contours: Some(1),
        max_composite_points: Some(0),
        max_composite_contours: Some(0),
        max_zones: Some(1),
        max_twilight_points: Some(0),
        max_storage: Some(0),
        max_function_defs: Some(0),
        max_instruction_defs: Some(0),
        max_stack_elements: Some(0),
        max_size_of_instructions: Some(0),
        max_component_elements: Some(0),
        max_component_depth: Some(0),
    };

    let post = Post {
        version: Version16Dot16::VERSION_3_0,
        italic_angle: Fixed::from_f64(0.0),
        underline_position: FWord::new(-100),
        underline_thickness: FWord::new(50),
        is_fixed_pitch: 1,
        min_mem_type42: 0,
        max_mem_type42: 0,
        min_mem_type1: 0,
        max_mem_type1: 0,
        num_glyphs: Some(glyphs.len() as u16),
        glyph_name_index: None,
        string_data: None,
    };

    let os2 = Os2 {
        x_avg_char_width: 700,
        us_weight_class: 400,
        us_width_class: 5,
        ..Default::default()
    };

    let name = Name::new(
        names
            .iter()
            .map(|&(id, value)| NameRecord::new(3, 1, 0x409, NameId::new(id), value.to_string().into()))
            .collect(),
    );

    let mut builder = FontBuilder::new();
    builder.add_table(&head).unwrap();
    builder.add_table(&hhea).unwrap();
    builder.add_table(&hmtx).unwrap();
    builder.add_table(&maxp).unwrap();
    builder.add_table(&post).unwrap();
    builder.add_table(&os2).unwrap();
    builder.add_table(&name).unwrap();
    builder.add_table(&glyf).unwrap();
    builder.add_table(&loca).unwrap();
    builder.build()
}
