// Copyright 2025 DepMatrix Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cyclomatic complexity as 1 + decision points, counted on source with
//! comments and string literals stripped first so keywords inside them do
//! not inflate the score. JS/TS files are scored on their AST instead (see
//! `analyzer::js`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::filter::Lang;

static C_BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static C_LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//[^\n]*").unwrap());
static DQ_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r#""(?:[^"\\\n]|\\.)*""#).unwrap());
static SQ_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(?:[^'\\\n]|\\.)*'").unwrap());
static BACKTICK_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)`[^`]*`").unwrap());
static PY_TRIPLE_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"{3}.*?"{3}|'{3}.*?'{3}"#).unwrap());
static PY_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"#[^\n]*").unwrap());

static RE_IF_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bif\s*\(").unwrap());
static RE_FOR_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfor\s*\(").unwrap());
static RE_WHILE_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bwhile\s*\(").unwrap());
static RE_DO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdo\s*\{").unwrap());
static RE_CASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bcase\b").unwrap());
static RE_CATCH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bcatch\s*\(").unwrap());
static RE_TERNARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?[^:]*:").unwrap());
static RE_AND: Lazy<Regex> = Lazy::new(|| Regex::new(r"&&").unwrap());
static RE_OR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|\|").unwrap());
static RE_FOREACH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bforeach\s*\(").unwrap());
static RE_KW_IF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bif\b").unwrap());
static RE_KW_FOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfor\b").unwrap());
static RE_KW_SWITCH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bswitch\b").unwrap());
static RE_KW_SELECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bselect\b").unwrap());
static RE_PY_DECISIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:if|elif|for|while|except|and|or|else)\b").unwrap());

fn count(re: &Regex, s: &str) -> u32 {
    re.find_iter(s).count() as u32
}

/// Remove comments and string literals from C-family source (C/C++, Java,
/// C#, Go). Comments go first so `//` inside a removed comment cannot eat a
/// following line; backticks cover Go raw strings.
pub fn strip_c_like(source: &str) -> String {
    let s = C_BLOCK_COMMENT.replace_all(source, "");
    let s = C_LINE_COMMENT.replace_all(&s, "");
    let s = BACKTICK_STRING.replace_all(&s, "");
    let s = DQ_STRING.replace_all(&s, "");
    SQ_STRING.replace_all(&s, "").into_owned()
}

pub fn strip_python(source: &str) -> String {
    let s = PY_TRIPLE_STRING.replace_all(source, "");
    let s = DQ_STRING.replace_all(&s, "");
    let s = SQ_STRING.replace_all(&s, "");
    PY_COMMENT.replace_all(&s, "").into_owned()
}

/// Score for C/C++, Java, C# and Go files.
pub fn c_family_score(lang: Lang, source: &str) -> u32 {
    let stripped = strip_c_like(source);
    let mut n = 1u32;
    match lang {
        Lang::Go => {
            // Go spells its decisions without parentheses and adds
            // switch/select; ternary, catch and do-while do not exist.
            n += count(&RE_KW_IF, &stripped);
            n += count(&RE_KW_FOR, &stripped);
            n += count(&RE_CASE, &stripped);
            n += count(&RE_KW_SWITCH, &stripped);
            n += count(&RE_KW_SELECT, &stripped);
        }
        _ => {
            n += count(&RE_IF_PAREN, &stripped);
            n += count(&RE_FOR_PAREN, &stripped);
            n += count(&RE_WHILE_PAREN, &stripped);
            n += count(&RE_DO, &stripped);
            n += count(&RE_CASE, &stripped);
            n += count(&RE_CATCH, &stripped);
            n += count(&RE_TERNARY, &stripped);
            if lang == Lang::CSharp {
                n += count(&RE_FOREACH, &stripped);
            }
        }
    }
    n += count(&RE_AND, &stripped);
    n += count(&RE_OR, &stripped);
    n
}

pub fn python_score(source: &str) -> u32 {
    let stripped = strip_python(source);
    1 + count(&RE_PY_DECISIONS, &stripped)
}
