//! LLM instruction templates for summarization and synthesis.
//!
//! The synthesis template fixes the output dialect that `topics` parses and
//! `provenance` post-processes. The model is told never to emit URLs; the
//! verified links are appended by [`crate::provenance::append_provenance`].

/// Instruction for summarizing a single source.
pub const SUMMARY_PROMPT: &str = r#"
# PRIMARY INSTRUCTION:
What is 1) the main thesis or point in this content and 2) what is each important point, question, or idea? Please use concise bullet points. Start the first bullet with "The overall main point is".
## EXCEPTION
If, and only if, the content is a hacker news discussion thread, then:
1) provide a bullet list starting with a statement of the content the discussion thread is about including a link if possible
2) Use the second bullet to provide an overall summary of the points of view, including any major controversies or areas of consensus
3) then provide a bullet point for every useful, interesting, insightful, or otherwise noteworthy comment, including the username of the commenter. Be somewhat concise, however, maintain the essence of what is being said.
4) if the content is not specifically a hacker news discussion thread, then apply the instruction stated under the header # PRIMARY INSTRUCTION and NOT under the subheader ## EXCEPTION
"#;

/// Instruction for synthesizing two sources into one narrative document.
pub const SYNTHESIS_PROMPT: &str = r###"
For this next instruction, you must take into account every single point raised in each of the two pieces of content you have been provided and be sure to bring them all to the fore.

Synthesize everything into a narrative that flows: the result will be turned into speech, so the listener must be able to follow what is going on and have an informative and enjoyable listening experience.

The instruction:
---
- Identify every clear assertion (every idea, perspective, objection, or question) and state each one as an affirmative, clear sentence.
- CRITICAL FORMAT REQUIREMENT: Each topic MUST start with EXACTLY this format: "## TOPIC FOLLOWS: " (two hash marks, space, the words TOPIC FOLLOWS, colon, space, then the topic title). Do NOT use any other format like "TOPIC FOLLOWS ##" or "TOPIC FOLLOWS:" alone. The exact required format is:

## TOPIC FOLLOWS: Your Topic Title Here

- Start the response with a descriptive top level headline (using a single # mark) that captures the thrust of the entire content.
- Under each "## TOPIC FOLLOWS:" header write clear bullet points (starting with • or -) for every point made in any content (articles, comments, etc.) on that topic. Capture the essence of each point; do not compress it until it is no longer understandable. Points that do not fit under a topic go after the topics under a section titled "## MISC Topics" (this section does NOT use TOPIC FOLLOWS).
- Cover every vantage point, including the debates and the back-and-forth, as a narrative arc told through these affirmative statements and bullet points.
- If there is BOTH a hacker news thread and an article, attribute every bullet to either the article or the username in the hacker news thread. Start each bullet with "According to the Article:" or "According to Hacker News User [username]:". If the source is neither an article nor a hacker news thread, use the best term.
- Be complete. Do not leave out ANY topic or perspective. Verbosity is preferred over omission.
- At the VERY END, include a ## PROVENANCE section (no TOPIC FOLLOWS) with bullets for the article's title, the author(s), and the publication. Do NOT include any URLs; the system will append verified links.

FORMATTING EXAMPLE:
# Main Headline About The Topic

## TOPIC FOLLOWS: First Major Topic
• According to the Article: First point about this topic
• According to Hacker News User username: Second point about this topic

## TOPIC FOLLOWS: Second Major Topic
• According to the Article: Point about second topic

## MISC Topics
• Miscellaneous point that doesn't fit elsewhere

## PROVENANCE
- Article Title
- Author names
- Publication name
"###;

/// Format the summarization payload for one source.
pub fn format_summary_prompt(content: &str) -> String {
    format!("{}\n\nCONTENT:\n{}", SUMMARY_PROMPT, content)
}

/// Format the synthesis payload for two sources.
pub fn format_synthesis_prompt(content1: &str, content2: &str) -> String {
    format!(
        "{}\n\nContent 1:\n{}\n\n---\n\nContent 2:\n{}",
        SYNTHESIS_PROMPT, content1, content2
    )
}
