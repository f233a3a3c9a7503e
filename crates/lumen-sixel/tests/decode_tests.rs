//! End-to-end decode scenarios: code points through the parser into the
//! builder, and onward into the image pool.

use lumen_graphics::{
    CellCoord, CellSpan, ImageAlignment, ImageDiscardQueue, ImageFormat, ImagePool, ImageResize,
    PixelCoord, PixelSize, RgbColor, RgbaColor,
};
use lumen_sixel::{SixelColorPalette, SixelImageBuilder, SixelParser};

const BLACK: RgbaColor = RgbaColor::OPAQUE_BLACK;

fn decode(input: &str, max_size: PixelSize) -> SixelImageBuilder {
    let palette = SixelColorPalette::new(256, 256).shared();
    let mut builder = SixelImageBuilder::new(max_size, 1, 1, BLACK, palette);
    SixelParser::decode(input, &mut builder);
    builder
}

#[test]
fn empty_stream_yields_background_raster() {
    let builder = decode("", PixelSize::new(10, 6));

    assert_eq!(builder.data().len(), 10 * 6 * 4);
    for row in 0..6 {
        for column in 0..10 {
            assert_eq!(builder.at(PixelCoord::new(row, column)), BLACK);
        }
    }
}

#[test]
fn single_full_sixel_paints_one_column() {
    let palette = SixelColorPalette::new(256, 256).shared();
    let red = RgbColor::new(255, 0, 0);
    palette.borrow_mut().set_color(1, red);

    let mut builder = SixelImageBuilder::new(PixelSize::new(10, 6), 1, 1, BLACK, palette);
    // '~' is code 126: all six bits set.
    SixelParser::decode("#1~", &mut builder);

    for row in 0..6 {
        assert_eq!(builder.at(PixelCoord::new(row, 0)), red.with_alpha(255));
    }
    for row in 0..6 {
        for column in 1..10 {
            assert_eq!(builder.at(PixelCoord::new(row, column)), BLACK);
        }
    }
}

#[test]
fn repeat_paints_consecutive_columns() {
    // 'N' is code 78: value 15, bits 0..3.
    let builder = decode("#2!4N", PixelSize::new(10, 6));
    let expected = RgbColor::new(204, 33, 33).with_alpha(255); // VT340 register 2

    for column in 0..4 {
        for row in 0..4 {
            assert_eq!(
                builder.at(PixelCoord::new(row, column)),
                expected,
                "({row},{column})"
            );
        }
        for row in 4..6 {
            assert_eq!(builder.at(PixelCoord::new(row, column)), BLACK);
        }
    }
    for row in 0..6 {
        assert_eq!(builder.at(PixelCoord::new(row, 4)), BLACK);
    }
}

#[test]
fn graphics_newline_starts_the_next_band() {
    let builder = decode("#1~-~", PixelSize::new(10, 12));
    let blue = RgbColor::new(51, 51, 204).with_alpha(255); // VT340 register 1

    for row in 0..12 {
        assert_eq!(builder.at(PixelCoord::new(row, 0)), blue, "row {row}");
    }
    // The second band went to rows 6..12, not to a second column.
    for row in 0..12 {
        assert_eq!(builder.at(PixelCoord::new(row, 1)), BLACK);
    }
}

#[test]
fn raster_declaration_bounds_the_image() {
    let builder = decode("\"1;1;20;12#1!30~", PixelSize::new(100, 100));

    assert_eq!(builder.size(), PixelSize::new(20, 12));
    assert_eq!(builder.data().len(), 20 * 12 * 4);
    // 30 repeats were requested but only 20 columns exist.
    let blue = RgbColor::new(51, 51, 204).with_alpha(255);
    for column in 0..20 {
        assert_eq!(builder.at(PixelCoord::new(0, column)), blue);
    }
    assert_eq!(builder.sixel_cursor().column, 20);
}

#[test]
fn color_definition_scales_to_full_range() {
    let palette = SixelColorPalette::new(256, 256).shared();
    let mut builder =
        SixelImageBuilder::new(PixelSize::new(4, 6), 1, 1, BLACK, palette.clone());
    // Define register 5, select it, paint with it.
    SixelParser::decode("#5;2;100;0;0#5~", &mut builder);

    assert_eq!(palette.borrow().at(5), RgbColor::new(255, 0, 0));
    assert_eq!(builder.at(PixelCoord::new(0, 0)), RgbaColor::new(255, 0, 0, 255));
}

#[test]
fn carriage_return_overpaints_in_place() {
    let builder = decode("#2~~$#1~", PixelSize::new(4, 6));
    let blue = RgbColor::new(51, 51, 204).with_alpha(255);
    let red = RgbColor::new(204, 33, 33).with_alpha(255);

    assert_eq!(builder.at(PixelCoord::new(0, 0)), blue);
    assert_eq!(builder.at(PixelCoord::new(0, 1)), red);
}

#[test]
fn palette_persists_across_images_in_one_session() {
    let palette = SixelColorPalette::new(256, 256).shared();
    // 50 on the 0..100 protocol scale lands on 127.
    let teal = RgbColor::new(0, 127, 127);

    let mut first =
        SixelImageBuilder::new(PixelSize::new(4, 6), 1, 1, BLACK, palette.clone());
    SixelParser::decode("#9;2;0;50;50~", &mut first);
    drop(first);

    let mut second =
        SixelImageBuilder::new(PixelSize::new(4, 6), 1, 1, BLACK, palette.clone());
    SixelParser::decode("#9~", &mut second);
    assert_eq!(second.at(PixelCoord::new(0, 0)), teal.with_alpha(255));
}

#[test]
fn decoded_raster_flows_into_the_pool() {
    let builder = decode("\"1;1;8;12#2!8~-!8~", PixelSize::new(100, 100));
    let (size, data) = builder.into_parts();
    assert_eq!(size, PixelSize::new(8, 12));

    let mut pool = ImagePool::new();
    let discards = ImageDiscardQueue::new();
    pool.set_removal_observer(discards.observer());

    let image = pool.create(ImageFormat::Rgba, size, data).unwrap();
    let raster = pool
        .rasterize(
            &image,
            ImageAlignment::default(),
            ImageResize::default(),
            RgbaColor::TRANSPARENT,
            CellSpan::new(2, 2),
            PixelSize::new(4, 6),
        )
        .unwrap();

    let red = RgbColor::new(204, 33, 33).with_alpha(255).to_bytes();
    for row in 0..2 {
        for column in 0..2 {
            let tile = raster.fragment(CellCoord::new(column, row));
            assert_eq!(tile.len(), 4 * 6 * 4);
            assert!(
                tile.chunks_exact(4).all(|px| px == red),
                "cell ({column},{row}) should be solid red"
            );
        }
    }

    let id = image.id();
    pool.remove_image(id).unwrap();
    assert_eq!(discards.drain(), vec![id]);
    // The rasterization still serves fragments from its own reference.
    assert_eq!(raster.fragment(CellCoord::new(0, 0)).len(), 4 * 6 * 4);
}

#[test]
fn undersized_image_pads_trailing_cells_with_default_color() {
    // A 6x9 raster in 2x2 cells of 4x6 pixels: the right column and bottom
    // row of cells are partially outside the image.
    let builder = decode("\"1;1;6;9#1!6~-!6~", PixelSize::new(100, 100));
    let (size, data) = builder.into_parts();
    assert_eq!(size, PixelSize::new(6, 9));

    let mut pool = ImagePool::new();
    let image = pool.create(ImageFormat::Rgba, size, data).unwrap();
    let fill = RgbaColor::new(10, 20, 30, 40);
    let raster = pool
        .rasterize(
            &image,
            ImageAlignment::default(),
            ImageResize::default(),
            fill,
            CellSpan::new(2, 2),
            PixelSize::new(4, 6),
        )
        .unwrap();

    let tile = raster.fragment(CellCoord::new(1, 1));
    // Cell (1,1) covers image columns 4..6 (2 available) and rows 6..9
    // (3 available): the right half of every row and the bottom three
    // rows are fill.
    for y in 0..6usize {
        for x in 0..4usize {
            let at = (y * 4 + x) * 4;
            let pixel = &tile[at..at + 4];
            let inside = y < 3 && x < 2;
            if inside {
                assert_ne!(pixel, fill.to_bytes(), "pixel ({x},{y}) should be image data");
            } else {
                assert_eq!(pixel, fill.to_bytes(), "pixel ({x},{y}) should be fill");
            }
        }
    }
}
