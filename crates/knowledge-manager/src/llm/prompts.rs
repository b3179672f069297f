//! System prompts and prompt builders used by the agents.

/// System prompt for pagination detection.
pub const NEXT_PAGE_SYSTEM: &str = "\
You are a careful web crawling assistant.

You receive the markdown of one web page and its URL. Decide whether the page
continues on a NEXT PAGE (a multi-part article or a paginated sequence) and
answer with:
- next_page_url: absolute URL of the next page, or null / empty string when
  there is none or you cannot find it
- confidence:
  - 0: there is no next page
  - 1: a link probably leads to the next page but it is not clear
  - 2: you are confident; the link text announces a continuation and the URL
    resembles the current one (same domain, similar path, incremented number)

Counts as a next page:
- continuation of the same article or series: Part 2, Next, Next page,
  Continue, Older (on newest-first blogs), arrows such as > or \u{bb}
- pagination patterns: page=2, ?page=2, /page/2/, /2, -2, _2, p=2,
  &start=10, offsets

Prefer URLs that share the domain, share a long path prefix and increment a
number relative to the current page.

Never select: category, tag, archive, home or site navigation; tables of
contents and fragment-only links (#...); comment pagination; social and
share links; author profiles; ads, newsletters, unrelated recommendations;
asset links (images, pdf, css, js, media).

With several candidates pick the strongest continuation (sequential number
or an explicit Next label) and lower the confidence when unsure. Without a
clear next page answer next_page_url = null and confidence = 0. Do not guess.";

/// System prompt for page summarization.
pub const SUMMARIZATION_SYSTEM: &str = "\
You are a helpful assistant. Extract the key points of a document so the
reader can learn its content quickly. Write it like a student's notes: only
information, facts and points worth remembering.

Keep:
- markdown headers as they are, with the content under each header turned
  into a bullet list
- every markdown image, placed in the bullet points

Remove:
- prose, paragraphs and sentences that carry no key point
- navigation, ads, author info, comments, footers, sidebars and other
  non-content elements
- filler

Bullet points are short standalone statements. Indent them to express a
hierarchy of ideas; number them when order matters.

Convert any remaining HTML tags to markdown.";

/// System prompt for run folder titles.
pub const FOLDER_TITLE_SYSTEM: &str = "\
Create a SHORT (3-6 words) descriptive folder title for fetched web content.
Use only letters and underscores.";

/// System prompt for transcript correction.
pub const TRANSCRIPT_CORRECTION_SYSTEM: &str = "\
You are an analyst restoring an automatically captured video transcript. The
capture is full of recognition errors. Understand the text and fix the
errors, then add line breaks and section titles so the document reads well.
Also give the video a one-line title.";

/// System prompt for overall transcript summaries.
pub const TRANSCRIPT_SUMMARY_SYSTEM: &str =
    "You produce precise hierarchical summaries of technical video transcripts. No verbosity.";

/// System prompt for per-paragraph transcript summaries.
pub const PARAGRAPH_SUMMARY_SYSTEM: &str = "\
You condense single transcript paragraphs into very terse bullet summaries
(25 words at most). Do not number them and keep technical terms.";

/// User turn asking for the next page of `url`.
#[must_use]
pub fn next_page_prompt(content: &str, url: &str) -> String {
    format!("Page content:\n{content}\nCurrent URL: {url}")
}

/// User turn asking to summarize page `index` of `total`.
#[must_use]
pub fn page_summary_prompt(index: usize, total: usize, page: &str) -> String {
    format!("Summarize the following web page (page {index} of {total}):\n{page}")
}

/// User turn asking for a folder title.
#[must_use]
pub fn folder_title_prompt(first_url: &str, sample: &str) -> String {
    format!("First URL: {first_url}\nContent sample (may be truncated):\n{sample}")
}

/// User turn carrying a raw transcript.
#[must_use]
pub fn transcript_correction_prompt(raw: &str) -> String {
    format!("Transcript:\n\n{raw}")
}

/// User turn asking for the knowledge-base summary of a corrected transcript.
#[must_use]
pub fn transcript_summary_prompt(corrected: &str) -> String {
    format!(
        "\
You are a technical analyst. Write a crisp summary of a technology-focused
video for an internal knowledge base.
Transcript (already corrected):
{corrected}

Use EXACTLY this layout:
<Headline: one or two lines with the core topic and its value>
Summary:
- Core point 1
  - Key detail or insight
  - Key detail or insight
- Core point 2
  - Implementation, architecture or concept
- (only as many bullets as needed)
When it applies, finish with:
Key Takeaways:
- (3 to 5 very short bullets)
Write nothing outside this layout."
    )
}

/// User turn asking for the summary of paragraph `index`.
#[must_use]
pub fn paragraph_prompt(index: usize, paragraph: &str) -> String {
    format!(
        "Paragraph {index}:\n{paragraph}\n\nReturn ONLY one bullet summary (no numbering, begin with '- ')."
    )
}

/// System prompt of the chat assistant named `bot_name`.
#[must_use]
pub fn chat_system(bot_name: &str) -> String {
    format!("You are {bot_name}, the family's helpful assistant. Answer concisely and kindly.")
}
