//! Structural invariants: FQN grammar conformance, fallback monotonicity,
//! compound flatness, and bounded recursion.

use regex::Regex;

use crate::ast::NodeKind;
use crate::indexer::ReadableIndex;
use crate::inferrer::{PhpType, TypeInferrer};
use crate::resolver::{defined_fqn, reference_to_fqn};
use crate::types::Fqn;

use super::indexed_document;

const CORPUS: &str = r#"<?php
namespace App\Core;

use Vendor\Lib\Client;
use function Vendor\Lib\connect;

const RETRIES = 3;

interface Runner {
    public function run();
}

trait Loggable {
    public function log($message) {}
}

class Service extends Client implements Runner {
    const VERSION = '1.0';
    public static $instances = 0;
    public $name = 'svc', $tags;

    /** @param int $retries */
    public function __construct($retries = RETRIES) {
        $this->tags = [];
        self::$instances = self::$instances + 1;
    }

    public static function make(): self {
        return new static();
    }

    public function run() {
        $client = connect();
        $label = $this->name . ':' . Service::VERSION;
        return $label;
    }
}

function helper(Service $service, $extra = 1.5) {
    return $service->run();
}

$svc = Service::make();
$svc->run();
helper($svc);
"#;

fn fqn_grammar() -> Regex {
    let ident = "[A-Za-z_][A-Za-z0-9_]*";
    Regex::new(&format!(
        r"^{ident}(\\{ident})*((::\${ident})|(::{ident}(\(\))?)|(->{ident}(\(\))?)|(\(\)))?$"
    ))
    .unwrap()
}

#[test]
fn every_emitted_fqn_matches_the_grammar() {
    let (document, index) = indexed_document(CORPUS);
    let ast = &document.ast;
    let grammar = fqn_grammar();

    let mut checked = 0usize;
    for id in ast.preorder() {
        if let Some(fqn) = defined_fqn(ast, id) {
            assert!(
                grammar.is_match(fqn.as_str()),
                "defined FQN violates grammar: {}",
                fqn
            );
            checked += 1;
        }
        if let Some(fqn) = reference_to_fqn(ast, &index, id) {
            assert!(
                grammar.is_match(fqn.as_str()),
                "reference FQN violates grammar: {}",
                fqn
            );
            checked += 1;
        }
    }
    assert!(checked > 20, "corpus exercised only {} names", checked);
}

#[test]
fn every_declaration_is_retrievable_under_its_fqn() {
    let (document, index) = indexed_document(CORPUS);
    let ast = &document.ast;

    for id in ast.preorder() {
        if let Some(fqn) = defined_fqn(ast, id) {
            let definition = index
                .get_definition(&fqn, false)
                .unwrap_or_else(|| panic!("{} not found after indexing", fqn));
            assert_eq!(definition.fqn, fqn);
        }
    }
}

#[test]
fn global_fallback_is_monotonic() {
    let (_, index) = indexed_document(CORPUS);

    let samples = [
        "App\\Core\\Service",
        "App\\Core\\Service->run()",
        "App\\Core\\helper()",
        "App\\Core\\RETRIES",
        "No\\Such\\thing()",
    ];
    for sample in samples {
        let fqn = Fqn::new(sample);
        if index.get_definition(&fqn, false).is_some() {
            assert!(
                index.get_definition(&fqn, true).is_some(),
                "fallback lost {}",
                sample
            );
        }
    }
}

#[test]
fn inference_is_total_over_the_corpus() {
    let (document, index) = indexed_document(CORPUS);
    let ast = &document.ast;
    let inferrer = TypeInferrer::new(ast, &index);

    // Every node gets *some* type without panicking; compounds stay flat.
    for id in ast.preorder() {
        let ty = inferrer.type_from_expression(id);
        assert_flat(&ty);
    }
}

fn assert_flat(ty: &PhpType) {
    if let PhpType::Compound(members) = ty {
        assert!(members.len() >= 2, "compound with fewer than two members");
        for member in members {
            assert!(
                !matches!(member, PhpType::Compound(_)),
                "nested compound: {:?}",
                ty
            );
        }
    }
}

#[test]
fn pathological_member_chains_stay_bounded() {
    // 100 chained accesses against a self-typed property: deeper than the
    // recursion bound, must degrade to a type rather than blow the stack.
    let chain = "->next".repeat(100);
    let source = format!(
        "<?php class Node {{ /** @var Node */ public $next; }} $n = new Node; $x = $n{};",
        chain
    );
    let (document, index) = indexed_document(&source);
    let ast = &document.ast;
    let inferrer = TypeInferrer::new(ast, &index);

    let outermost = super::find_nth(ast, NodeKind::MemberAccessExpression, 0);
    // Terminates and yields a type.
    let _ = inferrer.type_from_expression(outermost);
}

#[test]
fn cancelled_resolution_degrades_to_mixed() {
    let (document, index) = indexed_document(CORPUS);
    let ast = &document.ast;

    let cancel = crate::inferrer::CancelToken::new();
    cancel.cancel();
    let inferrer = TypeInferrer::with_cancel(ast, &index, cancel);

    for id in ast.preorder().into_iter().take(50) {
        assert_eq!(inferrer.type_from_expression(id), PhpType::Mixed);
    }
}
