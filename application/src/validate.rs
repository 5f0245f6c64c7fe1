use error_stack::Report;
use kernel::prelude::entity::{SelectLimit, SelectOffset};
use kernel::KernelError;

pub(crate) fn positive_id(raw: i64, field: &'static str) -> error_stack::Result<i64, KernelError> {
    if raw > 0 {
        Ok(raw)
    } else {
        Err(Report::new(KernelError::Validation)
            .attach_printable(format!("{field} must be positive, got {raw}")))
    }
}

pub(crate) fn non_blank(raw: String, field: &'static str) -> error_stack::Result<String, KernelError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Report::new(KernelError::Validation)
            .attach_printable(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn email(raw: String) -> error_stack::Result<String, KernelError> {
    let email = non_blank(raw, "email")?;
    if !email.contains('@') {
        return Err(Report::new(KernelError::Validation)
            .attach_printable(format!("{email} is not an email address")));
    }
    Ok(email)
}

pub(crate) fn page(
    limit: SelectLimit,
    offset: SelectOffset,
) -> error_stack::Result<(SelectLimit, SelectOffset), KernelError> {
    if *limit.as_ref() <= 0 || *offset.as_ref() < 0 {
        return Err(Report::new(KernelError::Validation).attach_printable(format!(
            "invalid page limit={} offset={}",
            limit.as_ref(),
            offset.as_ref()
        )));
    }
    Ok((limit, offset))
}

#[cfg(test)]
mod test {
    use kernel::prelude::entity::{SelectLimit, SelectOffset};
    use kernel::KernelError;

    use super::{email, non_blank, page, positive_id};

    #[test]
    fn rejects_non_positive_ids() {
        assert_eq!(positive_id(7, "book_id").unwrap(), 7);
        for raw in [0, -1] {
            let report = positive_id(raw, "book_id").unwrap_err();
            assert_eq!(report.current_context(), &KernelError::Validation);
        }
    }

    #[test]
    fn trims_text() {
        assert_eq!(non_blank("  Dune ".to_string(), "title").unwrap(), "Dune");
        assert!(non_blank("   ".to_string(), "title").is_err());
    }

    #[test]
    fn requires_at_sign() {
        assert_eq!(email(" a@b.org ".to_string()).unwrap(), "a@b.org");
        assert!(email("nobody".to_string()).is_err());
    }

    #[test]
    fn page_bounds() {
        assert!(page(SelectLimit::default(), SelectOffset::default()).is_ok());
        assert!(page(SelectLimit::new(0), SelectOffset::default()).is_err());
        assert!(page(SelectLimit::new(5), SelectOffset::new(-1)).is_err());
    }
}
