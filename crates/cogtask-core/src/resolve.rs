//! Resource resolution pass.
//!
//! Walks a decoded assessment depth-first and attaches the effective
//! [`ResourceContext`] to every node, verifying required images against a
//! [`ResourceLoader`] along the way. The pass produces a new tree and leaves
//! its input untouched, so a pristine decoded assessment can be resolved
//! against several loaders or contexts.

use crate::error::ResolveError;
use crate::model::{Assessment, FormStep, ImageInfo, InputField, InstructionStep, Step};
use crate::traits::{ResourceContext, ResourceLoader};

/// Resolve every node of `assessment` against `loader`, starting from `base`.
///
/// Each node resolves under its parent's context unless it declares its own
/// `bundleIdentifier`, in which case the context is rebased onto that bundle
/// for the node and everything below it. Steps keep their document order.
pub fn resolve_assessment(
    assessment: &Assessment,
    loader: &dyn ResourceLoader,
    base: &ResourceContext,
) -> Result<Assessment, ResolveError> {
    let context = effective_context(base, assessment.bundle_identifier.as_deref());
    tracing::debug!(
        "resolving assessment `{}` against loader `{}`",
        assessment.identifier,
        loader.name()
    );

    let image = bind_image(assessment.image.as_ref(), loader, &context)?;

    let mut steps = Vec::with_capacity(assessment.steps.len());
    for step in &assessment.steps {
        steps.push(resolve_step(step, loader, &context)?);
    }

    Ok(Assessment {
        steps,
        image,
        context: Some(context),
        ..assessment.clone()
    })
}

/// Resolve a single step under a parent context.
pub fn resolve_step(
    step: &Step,
    loader: &dyn ResourceLoader,
    parent: &ResourceContext,
) -> Result<Step, ResolveError> {
    match step {
        Step::Instruction(inner) => Ok(Step::Instruction(resolve_instruction(
            inner, loader, parent,
        )?)),
        Step::Form(inner) => Ok(Step::Form(resolve_form(inner, loader, parent)?)),
    }
}

fn resolve_instruction(
    step: &InstructionStep,
    loader: &dyn ResourceLoader,
    parent: &ResourceContext,
) -> Result<InstructionStep, ResolveError> {
    let context = effective_context(parent, step.bundle_identifier.as_deref());
    let image = bind_image(step.image.as_ref(), loader, &context)?;
    Ok(InstructionStep {
        image,
        context: Some(context),
        ..step.clone()
    })
}

fn resolve_form(
    step: &FormStep,
    loader: &dyn ResourceLoader,
    parent: &ResourceContext,
) -> Result<FormStep, ResolveError> {
    let context = effective_context(parent, step.bundle_identifier.as_deref());
    let image = bind_image(step.image.as_ref(), loader, &context)?;

    let input_fields = step
        .input_fields
        .iter()
        .map(|field| InputField {
            context: Some(context.clone()),
            ..field.clone()
        })
        .collect();

    Ok(FormStep {
        image,
        input_fields,
        context: Some(context),
        ..step.clone()
    })
}

/// The context a node resolves under: the parent context, rebased onto the
/// node's own bundle when it declares one.
fn effective_context(
    parent: &ResourceContext,
    bundle_override: Option<&str>,
) -> ResourceContext {
    match bundle_override {
        Some(bundle) => parent.with_bundle(bundle),
        None => parent.clone(),
    }
}

/// Bind an image to `context`, checking that the loader can serve it.
///
/// The loaded bytes are only an existence check and are discarded; display
/// layers fetch the resource again through the attached context. A required
/// image that cannot be served fails the whole pass, an optional one is left
/// unbound.
fn bind_image(
    image: Option<&ImageInfo>,
    loader: &dyn ResourceLoader,
    context: &ResourceContext,
) -> Result<Option<ImageInfo>, ResolveError> {
    let Some(image) = image else {
        return Ok(None);
    };

    let reference = context.reference_for(&image.image_name);
    match loader.load(&reference) {
        Ok(bytes) => {
            tracing::trace!("verified `{reference}` ({} bytes)", bytes.len());
            Ok(Some(ImageInfo {
                context: Some(context.clone()),
                ..image.clone()
            }))
        }
        Err(source) if image.required => Err(ResolveError::Resource { reference, source }),
        Err(source) => {
            tracing::debug!("optional image `{reference}` left unbound: {source}");
            Ok(Some(image.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::decode::decode_str;
    use crate::error::LoadError;
    use crate::traits::Node;

    struct StubLoader {
        known: HashSet<String>,
    }

    impl StubLoader {
        fn with(references: &[&str]) -> Self {
            Self {
                known: references.iter().map(|r| r.to_string()).collect(),
            }
        }
    }

    impl ResourceLoader for StubLoader {
        fn name(&self) -> &str {
            "stub"
        }

        fn load(&self, reference: &str) -> Result<Vec<u8>, LoadError> {
            if self.known.contains(reference) {
                Ok(vec![0u8; 16])
            } else {
                Err(LoadError::NotFound(reference.to_string()))
            }
        }
    }

    const DOC: &str = r#"{
        "type": "assessment",
        "identifier": "A1",
        "steps": [
            {
                "type": "instruction",
                "identifier": "intro",
                "image": {"imageName": "intro_art", "required": true}
            },
            {
                "type": "form",
                "identifier": "trial_1",
                "inputFields": [{"identifier": "response"}]
            }
        ]
    }"#;

    fn base() -> ResourceContext {
        ResourceContext::new("org.example.main", "en")
    }

    #[test]
    fn resolve_attaches_context_to_every_node() {
        let assessment = decode_str(DOC).unwrap();
        let loader = StubLoader::with(&["org.example.main/intro_art"]);

        let resolved = resolve_assessment(&assessment, &loader, &base()).unwrap();

        assert_eq!(resolved.resolved_context(), Some(&base()));
        for step in &resolved.steps {
            assert_eq!(step.resolved_context(), Some(&base()));
        }
        let Step::Form(form) = &resolved.steps[1] else {
            panic!("expected a form step");
        };
        assert_eq!(form.input_fields[0].context.as_ref(), Some(&base()));
        let Step::Instruction(intro) = &resolved.steps[0] else {
            panic!("expected an instruction step");
        };
        assert!(intro.image.as_ref().unwrap().is_bound());
    }

    #[test]
    fn resolve_leaves_the_input_untouched() {
        let assessment = decode_str(DOC).unwrap();
        let pristine = assessment.clone();
        let loader = StubLoader::with(&["org.example.main/intro_art"]);

        resolve_assessment(&assessment, &loader, &base()).unwrap();

        assert_eq!(assessment, pristine);
        assert!(assessment.resolved_context().is_none());
    }

    #[test]
    fn resolve_preserves_step_order() {
        let assessment = decode_str(DOC).unwrap();
        let loader = StubLoader::with(&["org.example.main/intro_art"]);

        let resolved = resolve_assessment(&assessment, &loader, &base()).unwrap();
        assert_eq!(resolved.step_identifiers(), assessment.step_identifiers());
    }

    #[test]
    fn resolve_missing_required_image_fails() {
        let assessment = decode_str(DOC).unwrap();
        let loader = StubLoader::with(&[]);

        let err = resolve_assessment(&assessment, &loader, &base()).unwrap_err();
        assert_eq!(err.reference(), "org.example.main/intro_art");
    }

    #[test]
    fn resolve_missing_optional_image_left_unbound() {
        let json = r#"{
            "type": "assessment",
            "identifier": "A1",
            "steps": [{
                "type": "instruction",
                "identifier": "intro",
                "image": {"imageName": "decoration"}
            }]
        }"#;
        let assessment = decode_str(json).unwrap();
        let loader = StubLoader::with(&[]);

        let resolved = resolve_assessment(&assessment, &loader, &base()).unwrap();
        let Step::Instruction(intro) = &resolved.steps[0] else {
            panic!("expected an instruction step");
        };
        let image = intro.image.as_ref().unwrap();
        assert!(!image.is_bound());
        assert_eq!(image.image_name, "decoration");
        // the step itself still resolves
        assert!(intro.resolved_context().is_some());
    }

    #[test]
    fn root_image_binds_and_steps_inherit_the_root_context() {
        let json = r#"{
            "type": "assessment",
            "identifier": "A1",
            "image": {"imageName": "cover.png", "required": true},
            "steps": [
                {"type": "instruction", "identifier": "intro"},
                {"type": "form", "identifier": "trial_1"}
            ]
        }"#;
        let assessment = decode_str(json).unwrap();
        let loader = StubLoader::with(&["org.example.main/cover.png"]);

        let resolved = resolve_assessment(&assessment, &loader, &base()).unwrap();
        assert!(resolved.image.as_ref().unwrap().is_bound());
        for step in &resolved.steps {
            assert_eq!(step.resolved_context(), Some(&base()));
        }
    }

    #[test]
    fn bundle_override_rebases_the_subtree() {
        let json = r#"{
            "type": "assessment",
            "identifier": "A1",
            "steps": [
                {
                    "type": "instruction",
                    "identifier": "shared_intro",
                    "bundleIdentifier": "org.example.shared",
                    "image": {"imageName": "logo", "required": true}
                },
                {"type": "instruction", "identifier": "local"}
            ]
        }"#;
        let assessment = decode_str(json).unwrap();
        let loader = StubLoader::with(&["org.example.shared/logo"]);

        let resolved = resolve_assessment(&assessment, &loader, &base()).unwrap();

        let Step::Instruction(shared) = &resolved.steps[0] else {
            panic!("expected an instruction step");
        };
        let context = shared.resolved_context().unwrap();
        assert_eq!(context.bundle_identifier, "org.example.shared");
        assert_eq!(context.locale, "en");
        assert_eq!(
            shared.image.as_ref().unwrap().context.as_ref(),
            Some(context)
        );

        // the sibling stays on the base bundle
        assert_eq!(resolved.steps[1].resolved_context(), Some(&base()));
    }

    #[test]
    fn resolve_is_deterministic() {
        let assessment = decode_str(DOC).unwrap();
        let loader = StubLoader::with(&["org.example.main/intro_art"]);

        let first = resolve_assessment(&assessment, &loader, &base()).unwrap();
        let second = resolve_assessment(&assessment, &loader, &base()).unwrap();
        assert_eq!(first, second);
    }
}
