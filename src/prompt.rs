use crate::models::{BackgroundSpec, BackgroundType};

/// Build the instruction sent alongside the two images.
///
/// Image 1 is the style reference, image 2 is the user's photo. Element
/// descriptions are inserted verbatim.
pub fn build_prompt(background: &BackgroundSpec) -> String {
    let elements = background.elements();

    let mut prompt = String::from(
        "Recreate the avatar style of image 1 using the person in the photo of image 2.\n",
    );
    if let Some(elements) = elements {
        prompt.push_str(&format!("Background elements: {}\n", elements));
    }

    prompt.push_str("\nRequirements:\n");
    prompt.push_str(&format!(
        "- The base color of the avatar is {}\n",
        fill_policy(background)
    ));
    prompt.push_str(&format!(
        "- Redraw the background inside the circle as an illustration without keeping wall details, using {} to form a regular, sparsely distributed illustrated pattern\n",
        elements.unwrap_or("random patterns")
    ));
    prompt.push_str(
        "- Use the person from image 2 as the subject, zoomed in so only the upper body is shown\n",
    );
    prompt.push_str("- Square aspect ratio\n");
    prompt
}

fn fill_policy(background: &BackgroundSpec) -> String {
    match background.kind {
        BackgroundType::Color => format!(
            "the color {}",
            background
                .color
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or("chosen automatically")
        ),
        BackgroundType::Auto => "extracted from the dominant colors of image 2".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_background() {
        let prompt = build_prompt(&BackgroundSpec::color("#6366F1"));
        assert!(prompt.contains("base color of the avatar is the color #6366F1"));
        assert!(prompt.contains("using random patterns"));
        assert!(!prompt.contains("Background elements:"));
    }

    #[test]
    fn test_color_background_without_color() {
        let spec = BackgroundSpec {
            kind: BackgroundType::Color,
            color: None,
            elements: None,
        };
        assert!(build_prompt(&spec).contains("the color chosen automatically"));
    }

    #[test]
    fn test_auto_background_with_elements() {
        let spec = BackgroundSpec::auto().with_elements("stars & \"moons\"");
        let prompt = build_prompt(&spec);
        assert!(prompt.contains("dominant colors of image 2"));
        assert!(prompt.contains("Background elements: stars & \"moons\"\n"));
        assert!(prompt.contains("using stars & \"moons\" to form"));
    }

    #[test]
    fn test_fixed_instructions_and_determinism() {
        let spec = BackgroundSpec::auto();
        let prompt = build_prompt(&spec);
        assert!(prompt.contains("upper body"));
        assert!(prompt.contains("Square aspect ratio"));
        assert_eq!(prompt, build_prompt(&spec));
    }
}
