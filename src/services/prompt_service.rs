/// Render the single-question instruction for one answer and its context sentence.
pub fn build_prompt(answer: &str, context: &str) -> String {
    format!(
        r#"You are an experienced teacher writing a quiz. Using the context below, write exactly one multiple-choice question.

Rules:
1. The correct answer must be exactly "{answer}". If that text is an incomplete fragment, rewrite it as a complete, natural phrase taken from the context, and use the rewritten phrase as the answer.
2. Ask the question directly. Never begin it with framing such as "According to the context," "Based on the text," or "In the passage,".
3. Write exactly three incorrect but plausible options (distractors) that are conceptually related to the correct answer.
4. The options array holds the correct answer and the three distractors, four strings in total, in any order.

Context: "{context}"

Output: reply with ONLY one valid JSON object, with no surrounding prose and no markdown code fences, in exactly this shape:
{{"question": "The question?", "options": ["Option 1", "Option 2", "Option 3", "Option 4"], "answer": "The correct answer, identical to one of the options"}}"#
    )
}
