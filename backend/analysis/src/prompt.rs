//! The fixed instructional prompt sent with every page image.

/// Build the tutoring prompt for one analysis request.
///
/// The structure is fixed (overview, walkthrough, key terms, notes); only
/// the output language is configurable.
pub fn build_prompt(output_language: &str) -> String {
    format!(
        "You are an excellent teaching assistant. This image is a page from \
a textbook or reference book.\n\n\
Explain its content following these instructions:\n\n\
1. **Overview**: describe the main topic of this page in 1-2 sentences.\n\
2. **Detailed walkthrough**: explain the content step by step, in a way a \
beginner can follow.\n\
3. **Key terms**: list the important concepts and terms worth memorizing.\n\
4. **Supplementary notes**: add extra information or hints that deepen \
understanding, if any.\n\n\
Output format:\n\
- Organize the answer as readable markdown\n\
- Answer in {output_language}\n\
- Attach a short explanation to every technical term"
    )
}
