//! Provide Installer.

use crate::engine::PublicInstance;
use crate::error::{HandlerResult, OptionsError, Origin, Result};
use crate::inject::ProvideScope;
use crate::options::ProvideOptions;
use crate::types::ProvideRecord;

/// Evaluate a provide declaration. A factory runs once with `this`.
pub fn evaluate_provide(provide: &ProvideOptions, this: PublicInstance) -> HandlerResult<ProvideRecord> {
    match provide {
        ProvideOptions::Record(record) => Ok(record.clone()),
        ProvideOptions::Factory(factory) => factory(this),
    }
}

/// Publish every entry of the declaration into `scope`, in declaration order.
pub fn install_provide(provide: &ProvideOptions, this: PublicInstance, scope: &ProvideScope) -> Result<()> {
    let record = evaluate_provide(provide, this)
        .map_err(|err| OptionsError::handler(Origin::ProvideFactory, err))?;

    for (key, value) in record {
        tracing::trace!(%key, "provision published");
        scope.publish(key, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{allocate_instance, reset_registry};
    use crate::options::ComponentOptions;
    use crate::types::{Key, Symbol};
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn test_record_entries_published() {
        reset_registry();
        let this = allocate_instance(Rc::new(ComponentOptions::default()), None);
        let token = Symbol::new("bus");
        let mut record = ProvideRecord::new();
        record.insert(Key::from("theme"), json!("dark").into());
        record.insert(Key::from(&token), json!(1).into());
        let scope = ProvideScope::root();

        install_provide(&ProvideOptions::Record(record), this, &scope).unwrap();
        assert_eq!(scope.own_keys(), vec![Key::from("theme"), Key::from(token)]);
    }

    #[test]
    fn test_factory_sees_receiver() {
        reset_registry();
        let this = allocate_instance(Rc::new(ComponentOptions::default()), None);
        this.context().unwrap().assign("color", json!("red"));
        let scope = ProvideScope::root();

        let factory = ProvideOptions::Factory(Rc::new(|this: PublicInstance| {
            let mut record = ProvideRecord::new();
            record.insert(Key::from("color"), this.get("color")?.into());
            Ok(record)
        }));

        install_provide(&factory, this, &scope).unwrap();
        assert_eq!(
            scope.lookup(&Key::from("color")).unwrap().value(),
            Ok(json!("red"))
        );
    }

    #[test]
    fn test_factory_failure() {
        reset_registry();
        let this = allocate_instance(Rc::new(ComponentOptions::default()), None);
        let factory = ProvideOptions::Factory(Rc::new(|_: PublicInstance| Err("no provide".into())));

        let err = install_provide(&factory, this, &ProvideScope::root()).unwrap_err();
        assert_eq!(err.origin(), Some(&Origin::ProvideFactory));
    }
}
