// Local degraded-mode responses used when no provider can be reached
// Author: kelexine (https://github.com/kelexine)

use super::selector::FALLBACK_PROVIDER;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

pub const DEFAULT_LANGUAGE: &str = "javascript";

const MAX_ECHO_CHARS: usize = 200;

lazy_static! {
    static ref HELLO_WORLD: Regex = Regex::new(r"(?i)\bhello[\s,_-]*world\b").unwrap();
    static ref FUNCTION: Regex = Regex::new(r"(?i)\b(function|func|method|def|fn)\b").unwrap();
}

/// A locally generated answer, always tagged as degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackResponse {
    pub content: String,
    pub language: String,
    pub provider: &'static str,
    pub fallback: bool,
}

/// Produce a deterministic response for `prompt` without contacting any provider.
pub fn fallback_response(prompt: &str, language: Option<&str>) -> FallbackResponse {
    let language = language
        .map(|l| l.trim().to_ascii_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let content = if HELLO_WORLD.is_match(prompt) {
        hello_world(&language)
    } else if FUNCTION.is_match(prompt) {
        function_stub(&language)
    } else {
        echo(prompt, &language)
    };

    FallbackResponse {
        content,
        language,
        provider: FALLBACK_PROVIDER,
        fallback: true,
    }
}

fn hello_world(language: &str) -> String {
    match language {
        "python" | "py" => "print(\"Hello, World!\")".to_string(),
        "rust" | "rs" => "fn main() {\n    println!(\"Hello, World!\");\n}".to_string(),
        "go" | "golang" => {
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n    fmt.Println(\"Hello, World!\")\n}"
                .to_string()
        }
        "java" => "public class HelloWorld {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, World!\");\n    }\n}".to_string(),
        _ => "console.log(\"Hello, World!\");".to_string(),
    }
}

fn function_stub(language: &str) -> String {
    match language {
        "python" | "py" => "def my_function(param):\n    # implementation goes here\n    return param".to_string(),
        "rust" | "rs" => "fn my_function(param: &str) -> String {\n    // implementation goes here\n    param.to_string()\n}".to_string(),
        "go" | "golang" => "func myFunction(param string) string {\n    // implementation goes here\n    return param\n}".to_string(),
        "java" => "public static String myFunction(String param) {\n    // implementation goes here\n    return param;\n}".to_string(),
        "typescript" | "ts" => "function myFunction(param: string): string {\n  // implementation goes here\n  return param;\n}".to_string(),
        _ => "function myFunction(param) {\n  // implementation goes here\n  return param;\n}".to_string(),
    }
}

fn comment_prefix(language: &str) -> &'static str {
    match language {
        "python" | "py" | "ruby" | "shell" | "bash" | "yaml" => "#",
        "sql" | "lua" => "--",
        _ => "//",
    }
}

fn echo(prompt: &str, language: &str) -> String {
    let prefix = comment_prefix(language);
    let trimmed = prompt.trim();
    let mut excerpt: String = trimmed.chars().take(MAX_ECHO_CHARS).collect();
    if trimmed.chars().count() > MAX_ECHO_CHARS {
        excerpt.push_str("...");
    }
    let excerpt = excerpt.replace('\n', " ");

    format!(
        "{p} AI assistance is temporarily unavailable; this is a local fallback.\n\
         {p} Request: {excerpt}\n\
         {p} Please try again in a few moments.",
        p = prefix,
        excerpt = excerpt
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_world_per_language() {
        let py = fallback_response("write hello world", Some("python"));
        assert_eq!(py.content, "print(\"Hello, World!\")");
        assert!(py.fallback);
        assert_eq!(py.provider, "fallback");

        let js = fallback_response("Hello World please", None);
        assert_eq!(js.language, "javascript");
        assert!(js.content.contains("console.log"));
    }

    #[test]
    fn test_function_request() {
        let rust = fallback_response("Write a function that adds numbers", Some("Rust"));
        assert_eq!(rust.language, "rust");
        assert!(rust.content.starts_with("fn my_function"));
    }

    #[test]
    fn test_generic_echo() {
        let response = fallback_response("summarize my meeting notes", Some("python"));
        assert!(response.content.starts_with("# AI assistance"));
        assert!(response.content.contains("summarize my meeting notes"));
    }

    #[test]
    fn test_echo_truncates_long_prompts() {
        let prompt = "x".repeat(500);
        let response = fallback_response(&prompt, None);
        assert!(response.content.contains(&format!("{}...", "x".repeat(MAX_ECHO_CHARS))));
        assert!(!response.content.contains(&"x".repeat(MAX_ECHO_CHARS + 1)));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            fallback_response("a function please", Some("go")),
            fallback_response("a function please", Some("go"))
        );
    }
}
