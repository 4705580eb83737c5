//! Brick morphology regression test
//!
//! Checks the algebraic properties of brick dilation, erosion, opening and
//! closing on random images: closing is extensive, opening is
//! anti-extensive, both are idempotent, and no padding bit is ever set.
//!
//! Run with:
//! ```
//! cargo test -p scanfix-morph --test brick_reg
//! ```

use scanfix_core::{BWColor, BinaryImage, last_word_mask};
use scanfix_morph::{Brick, close_brick, dilate_brick, erode_brick, open_brick};
use scanfix_test::{RegParams, random_image};

fn padding_clear(img: &BinaryImage) -> bool {
    let mask = last_word_mask(img.width());
    (0..img.height()).all(|y| {
        img.row_data(y)
            .last()
            .is_none_or(|&word| word & !mask == 0)
    })
}

fn bricks() -> Vec<Brick> {
    vec![
        Brick::from_size(3, 3).unwrap(),
        Brick::from_size(7, 1).unwrap(),
        Brick::from_size(1, 12).unwrap(),
        Brick::from_size(21, 15).unwrap(),
        Brick::new(-2, -9, 9, 0).unwrap(),
        Brick::new(3, 1, 5, 4).unwrap(),
    ]
}

#[test]
fn brick_reg() {
    let mut rp = RegParams::new("brick");

    for (w, h) in [(95u32, 61u32), (128, 40), (33, 70)] {
        let img = random_image(w, h, 0.3).expect("random image");
        eprintln!("Image size: {}x{}, {} black", w, h, img.count_black());

        for brick in bricks() {
            let flipped = brick.flipped();

            // closing contains the input
            let dilated = dilate_brick(&img, &brick, img.rect(), BWColor::White).unwrap();
            rp.check(padding_clear(&dilated), "dilate padding");
            let closed = close_brick(&img, &brick, img.rect(), BWColor::White).unwrap();
            rp.check(img.is_subset_of(&closed), "close is extensive");

            // opening is contained in the input
            let eroded = erode_brick(&img, &brick, img.rect(), BWColor::White).unwrap();
            rp.check(padding_clear(&eroded), "erode padding");
            let opened = open_brick(&img, &brick, img.rect(), BWColor::White).unwrap();
            rp.check(opened.is_subset_of(&img), "open is anti-extensive");

            // dilate(erode(I, B), flip(B)) is the opening restricted to the image
            let reopened = dilate_brick(&eroded, &flipped, img.rect(), BWColor::White).unwrap();
            rp.check(reopened.is_subset_of(&img), "dilate of erode stays inside");

            // idempotence
            let opened2 = open_brick(&opened, &brick, img.rect(), BWColor::White).unwrap();
            rp.compare_images(&opened, &opened2);
            let closed2 = close_brick(&closed, &brick, img.rect(), BWColor::White).unwrap();
            rp.compare_images(&closed, &closed2);

            // erosion with black surroundings never loses pixels next to the edge
            let closed_black = erode_brick(&dilated, &flipped, img.rect(), BWColor::Black).unwrap();
            rp.check(img.is_subset_of(&closed_black), "close with black erosion");

            rp.check(
                padding_clear(&opened) && padding_clear(&closed),
                "open/close padding",
            );
        }
    }

    assert!(rp.cleanup(), "brick regression test failed");
}

#[test]
fn brick_duality_reg() {
    let mut rp = RegParams::new("brick_duality");

    // erosion of I equals the inverse of dilating the inverse with the
    // opposite surroundings
    let img = random_image(150, 45, 0.6).expect("random image");
    let inverse = img.inverted();
    for brick in bricks() {
        for surroundings in [BWColor::White, BWColor::Black] {
            let eroded = erode_brick(&img, &brick, img.rect(), surroundings).unwrap();
            let dual = dilate_brick(&inverse, &brick, img.rect(), surroundings.inverted())
                .unwrap()
                .inverted();
            rp.compare_images(&eroded, &dual);
        }
    }

    assert!(rp.cleanup(), "brick duality regression test failed");
}
