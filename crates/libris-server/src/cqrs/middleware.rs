//! Marker traits separating writes from reads
//!
//! Every request type sent through the mediator implements exactly one of
//! these. Commands change catalog state; queries never do.

/// A request that mutates the catalog
pub trait Command: Send + 'static {
    fn kind(&self) -> &'static str {
        "command"
    }
}

/// A read-only request
pub trait Query: Send + 'static {
    fn kind(&self) -> &'static str {
        "query"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::books::commands::DeleteBookCommand;
    use crate::features::books::queries::GetBookQuery;
    use uuid::Uuid;

    fn command_kind<C: Command>(cmd: &C) -> &'static str {
        cmd.kind()
    }

    fn query_kind<Q: Query>(query: &Q) -> &'static str {
        query.kind()
    }

    #[test]
    fn test_requests_are_classified() {
        let id = Uuid::new_v4();
        assert_eq!(command_kind(&DeleteBookCommand { id }), "command");
        assert_eq!(query_kind(&GetBookQuery { id }), "query");
    }
}
