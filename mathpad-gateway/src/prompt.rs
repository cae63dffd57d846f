//! # Prompt Builder
//!
//! Builds the instruction text sent alongside the canvas snapshot. The text
//! is a pure function of the variable map: same variables, same prompt.
//!
//! Every JSON example in the template uses `": "` spacing, so the compact
//! serialization of the variable map is the only compact JSON in the prompt.

use crate::schema::VariableMap;

const TASK: &str = "You are given an image of a hand-drawn sketch containing mathematical \
expressions, equations, or a graphical problem. Work out what is drawn and solve it.";

const PRECEDENCE: &str = "Evaluate arithmetic with the PEMDAS order of operations: \
Parentheses first, then Exponents, then Multiplication and Division from left to right, \
then Addition and Subtraction from left to right. \
Example: for 2 + 3 * 4, first 3 * 4 => 12, then 2 + 12 => 14. \
Example: for 2 + 3 + 5 * 4 - 8 / 2, first 5 * 4 => 20 and 8 / 2 => 4, \
then 2 + 3 => 5, 5 + 20 => 25, 25 - 4 => 21.";

const CASES: &str = r#"Exactly ONE of the following five cases applies to the image. Decide which one and answer in its format.
1. A single arithmetic expression such as 2 + 2, 3 * 4, 5 / 6 or 7 - 8. Return a list with ONE object: [{"expr": "the expression", "result": "the value"}].
2. A system of equations such as x^2 + 2x + 1 = 0 or 3y + 4x = 0. Solve for every unknown and return one object per variable, each flagged as an assignment: [{"expr": "x", "result": "2", "assign": true}, {"expr": "y", "result": "5", "assign": true}].
3. Variable assignments such as x = 4, y = 5. Return one object per assignment with the variable as "expr", the value as "result" and "assign": true.
4. A graphical or word problem drawn as a picture, such as colliding cars, a right triangle, a trigonometry figure or runs on a cricket wagon wheel. Pay close attention to the different colours in the drawing. Return a list with ONE object whose "expr" describes the problem in words and whose "result" is the computed answer.
5. A drawing of an abstract concept such as love, jealousy, patriotism, or a reference to a historic war, invention, discovery or quote. Return a list with ONE object whose "expr" explains the drawing and whose "result" names the concept."#;

const VARIABLES: &str = "These variables were assigned earlier. Wherever one of them \
appears in the image, substitute its value from this JSON object: ";

const FORMAT: &str = r#"Reply with the JSON array only. Do not use backticks, code fences or any markdown formatting. Quote every key and every string value with double quotes. Double every backslash inside values, so \f is written as \\f and \n as \\n."#;

/// Build the full instruction prompt for one solve request.
pub fn build_prompt(variables: &VariableMap) -> String {
    let vars = variables.to_json();

    let mut prompt = String::with_capacity(
        TASK.len() + PRECEDENCE.len() + CASES.len() + VARIABLES.len() + FORMAT.len() + vars.len() + 8,
    );
    prompt.push_str(TASK);
    prompt.push('\n');
    prompt.push_str(PRECEDENCE);
    prompt.push('\n');
    prompt.push_str(CASES);
    prompt.push('\n');
    prompt.push_str(VARIABLES);
    prompt.push_str(&vars);
    prompt.push_str(".\n");
    prompt.push_str(FORMAT);
    prompt
}

/// Structured-output schema for the reply: an array of result records.
///
/// Uses the OpenAPI subset accepted by `generationConfig.responseSchema`.
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "expr": { "type": "STRING" },
                "result": { "type": "STRING" },
                "assign": { "type": "BOOLEAN" }
            },
            "required": ["expr", "result"]
        }
    })
}
