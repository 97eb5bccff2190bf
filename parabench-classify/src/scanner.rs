//! Source scanner: walks Python parse trees to find and classify test units.

use crate::ClassifyError;
use parabench_core::{ClassifierPolicy, Signals, TestUnit};
use regex::{Regex, RegexBuilder};
use tree_sitter::{Node, Parser};

/// Policy with its patterns compiled once per run.
struct CompiledPolicy {
    interaction_threshold: u32,
    interaction: Vec<Regex>,
    workflow: Vec<Regex>,
    slow_keywords: Vec<String>,
}

impl CompiledPolicy {
    fn compile(policy: &ClassifierPolicy) -> Result<Self, ClassifyError> {
        let compile_all = |patterns: &[String], case_insensitive: bool| {
            patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(p)
                        .case_insensitive(case_insensitive)
                        .build()
                        .map_err(|e| ClassifyError::Policy {
                            pattern: p.clone(),
                            message: e.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            interaction_threshold: policy.interaction_threshold,
            interaction: compile_all(&policy.interaction_patterns, false)?,
            workflow: compile_all(&policy.workflow_patterns, true)?,
            slow_keywords: policy
                .slow_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
        })
    }

    fn signals(&self, body: &str) -> Signals {
        let interaction_count = self
            .interaction
            .iter()
            .map(|re| re.find_iter(body).count() as u32)
            .sum();
        let workflow = self.workflow.iter().any(|re| re.is_match(body));
        let lower = body.to_lowercase();
        let slow = self.slow_keywords.iter().any(|k| lower.contains(k));

        Signals {
            interaction_count,
            workflow,
            slow,
        }
    }
}

/// Scanner that finds test units in Python source and classifies them.
pub struct SourceScanner {
    parser: Parser,
    policy_source: ClassifierPolicy,
    compiled: CompiledPolicy,
}

impl SourceScanner {
    /// Create a scanner for the given policy.
    pub fn new(policy: &ClassifierPolicy) -> Result<Self, ClassifyError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ClassifyError::Parser(e.to_string()))?;

        Ok(Self {
            parser,
            policy_source: policy.clone(),
            compiled: CompiledPolicy::compile(policy)?,
        })
    }

    /// Scan one file's source, returning classified units.
    ///
    /// Returns `Err(message)` when the source does not parse cleanly; the
    /// caller excludes the whole file (fails closed).
    pub fn scan_source(&mut self, file: &str, source: &str) -> Result<Vec<TestUnit>, String> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| "parser produced no tree".to_string())?;

        if tree.root_node().has_error() {
            return Err("syntax error in source".to_string());
        }

        let mut units = Vec::new();
        self.walk(tree.root_node(), source, file, None, &mut units);
        Ok(units)
    }

    fn walk(
        &self,
        node: Node,
        source: &str,
        file: &str,
        current_class: Option<&str>,
        units: &mut Vec<TestUnit>,
    ) {
        match node.kind() {
            "function_definition" => {
                // Covers async defs too: the grammar wraps both in
                // function_definition, with `async` as a leading token.
                if let Some(unit) = self.check_function(node, source, file, current_class) {
                    units.push(unit);
                }
            }
            "class_definition" => {
                if let Some(class_name) = child_identifier(node, source) {
                    if class_name.starts_with("Test") {
                        for child in node.children(&mut node.walk()) {
                            if child.kind() == "block" {
                                self.walk(child, source, file, Some(&class_name), units);
                            }
                        }
                    }
                }
            }
            _ => {
                for child in node.children(&mut node.walk()) {
                    self.walk(child, source, file, current_class, units);
                }
            }
        }
    }

    fn check_function(
        &self,
        node: Node,
        source: &str,
        file: &str,
        current_class: Option<&str>,
    ) -> Option<TestUnit> {
        let name = child_identifier(node, source)?;
        if !name.starts_with("test_") {
            return None;
        }

        let body = node_text(node, source);
        let signals = self.compiled.signals(body);
        let category = self.policy_source.decide(&signals);

        Some(TestUnit {
            name: TestUnit::node_id(file, current_class, &name),
            file: file.to_string(),
            line: node.start_position().row as u32 + 1,
            class_name: current_class.map(String::from),
            signals,
            category: Some(category),
        })
    }
}

fn child_identifier(node: Node, source: &str) -> Option<String> {
    for child in node.children(&mut node.walk()) {
        if child.kind() == "identifier" {
            return Some(node_text(child, source).to_string());
        }
    }
    None
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use parabench_core::Category;

    fn scan(source: &str) -> Vec<TestUnit> {
        let mut scanner = SourceScanner::new(&ClassifierPolicy::default()).unwrap();
        scanner.scan_source("tests/test_sample.py", source).unwrap()
    }

    #[test]
    fn finds_module_level_and_class_tests() {
        let units = scan(
            r#"
def test_top():
    assert True

class TestGroup:
    def test_inner(self):
        assert True

class Helper:
    def test_not_in_test_class(self):
        assert True
"#,
        );
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "tests/test_sample.py::test_top",
                "tests/test_sample.py::TestGroup::test_inner",
            ]
        );
    }

    #[test]
    fn async_tests_are_discovered() {
        let units = scan(
            r#"
class TestAsync:
    async def test_await_path(self):
        result = await client.get()
        assert result
"#,
        );
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "tests/test_sample.py::TestAsync::test_await_path");
    }

    #[test]
    fn heavy_interaction_promotes_to_workflow() {
        let units = scan(
            r#"
async def test_many_mocks():
    mock_api.setup()
    await client.create()
    await client.start()
    mock_api.assert_called()
    mock_proxmox.assert_called_once()
"#,
        );
        assert_eq!(units[0].category, Some(Category::Workflow));
        assert!(units[0].signals.interaction_count > 3);
    }

    #[test]
    fn lifecycle_name_marks_workflow() {
        let units = scan("def test_container_lifecycle():\n    run()\n");
        assert_eq!(units[0].category, Some(Category::Workflow));
        assert!(units[0].signals.workflow);
    }

    #[test]
    fn timeout_keyword_marks_heavy() {
        let units = scan("def test_start():\n    wait(timeout=60)\n");
        assert_eq!(units[0].category, Some(Category::Heavy));
        assert!(units[0].signals.slow);
    }

    #[test]
    fn slow_beats_workflow_priority() {
        let units = scan(
            "def test_full_lifecycle_with_timeout():\n    create(); start(); stop(); wait(timeout=5)\n",
        );
        assert_eq!(units[0].category, Some(Category::Heavy));
    }

    #[test]
    fn plain_assertion_is_fast_isolated() {
        let units = scan("def test_math():\n    assert 1 + 1 == 2\n");
        assert_eq!(units[0].category, Some(Category::FastIsolated));
    }

    #[test]
    fn syntax_error_rejects_whole_file() {
        let mut scanner = SourceScanner::new(&ClassifierPolicy::default()).unwrap();
        let err = scanner
            .scan_source("tests/test_bad.py", "def test_x(:\n    pass\n")
            .unwrap_err();
        assert!(err.contains("syntax error"));
    }

    #[test]
    fn line_numbers_are_one_indexed() {
        let units = scan("\n\ndef test_here():\n    pass\n");
        assert_eq!(units[0].line, 3);
    }
}
