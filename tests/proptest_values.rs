mod proptest_helpers;

use labelconf::LabelInterface;
use proptest::prelude::*;
use proptest_helpers::*;
use serde_json::json;

fn brush_interface() -> LabelInterface {
    LabelInterface::parse(
        r#"<View><Image name="image" value="$image"/><Brush name="mask" toName="image"/></View>"#,
    )
    .expect("parse brush config")
}

fn rect_interface() -> LabelInterface {
    LabelInterface::parse(&rectangle_config()).expect("parse rectangle config")
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn well_formed_rle_is_accepted(rle in arb_valid_rle()) {
        let li = brush_interface();
        let control = li.get_control(Some("mask")).expect("mask");
        let value = json!({"format": "rle", "rle": rle});
        prop_assert!(control.validate_value(&value));
    }

    #[test]
    fn odd_length_rle_is_rejected(mut rle in arb_valid_rle(), extra in 0i64..255) {
        rle.push(extra);
        let li = brush_interface();
        let control = li.get_control(Some("mask")).expect("mask");
        let value = json!({"format": "rle", "rle": rle});
        prop_assert!(!control.validate_value(&value));
    }

    #[test]
    fn zero_run_is_rejected(mut rle in arb_valid_rle(), at in any::<prop::sample::Index>()) {
        prop_assume!(!rle.is_empty());
        let runs = rle.len() / 2;
        rle[at.index(runs) * 2 + 1] = 0;
        let li = brush_interface();
        let control = li.get_control(Some("mask")).expect("mask");
        let value = json!({"format": "rle", "rle": rle});
        prop_assert!(!control.validate_value(&value));
    }

    #[test]
    fn rectangles_inside_bounds_pass(
        x in arb_percent(),
        y in arb_percent(),
        w in arb_percent(),
        h in arb_percent(),
        labels in arb_declared_labels(),
    ) {
        let li = rect_interface();
        let control = li.get_control(Some("box")).expect("box");
        let value = json!({"x": x, "y": y, "width": w, "height": h, "rectanglelabels": labels});
        prop_assert!(control.validate_value(&value), "rejected {}", value);
    }

    #[test]
    fn rectangles_outside_bounds_fail(x in arb_out_of_bounds(), y in arb_percent()) {
        let li = rect_interface();
        let control = li.get_control(Some("box")).expect("box");
        let value = json!({"x": x, "y": y, "width": 10, "height": 10, "rectanglelabels": ["Cat"]});
        let err = control.check_value(&value).expect_err("x out of bounds");
        prop_assert!(err.to_string().contains("out of bounds"));
    }

    #[test]
    fn undeclared_labels_are_rejected(
        declared in arb_declared_labels(),
        intruder in arb_undeclared_label(),
    ) {
        let li = rect_interface();
        let control = li.get_control(Some("box")).expect("box");
        let mut labels = declared;
        labels.push(intruder);
        let value = json!({"x": 1, "y": 1, "width": 1, "height": 1, "rectanglelabels": labels});
        prop_assert!(!control.validate_value(&value));
        prop_assert!(!control.validate_labels(&labels));
    }
}
