mod common;

use anyhow::Result;
use chrono::Utc;
use common::{credit, debit, test_service};
use ledgerd::application::AppError;
use ledgerd::domain::{NewTransaction, STATEMENT_SIZE, TransactionKind};

#[tokio::test]
async fn test_statement_of_fresh_account() -> Result<()> {
    let Some((service, _schema)) = test_service().await? else {
        return Ok(());
    };
    service.create_account(3, 1_000_000).await?;

    let before = Utc::now();
    let statement = service.get_statement(3).await?;

    assert_eq!(statement.balance, 0);
    assert_eq!(statement.limit, 1_000_000);
    assert!(statement.transactions.is_empty());
    assert!(statement.as_of >= before);

    Ok(())
}

#[tokio::test]
async fn test_statement_lists_most_recent_first() -> Result<()> {
    let Some((service, _schema)) = test_service().await? else {
        return Ok(());
    };
    service.create_account(1, 1000).await?;

    let mut last = None;
    for (i, amount) in [10, 20, 30, 40].into_iter().enumerate() {
        let tx = if i % 2 == 0 {
            NewTransaction::credit(amount, &format!("tx{i}"))?
        } else {
            NewTransaction::debit(amount, &format!("tx{i}"))?
        };
        last = Some(service.apply_transaction(1, tx).await?);
    }

    let statement = service.get_statement(1).await?;
    let descriptions: Vec<&str> = statement
        .transactions
        .iter()
        .map(|tx| tx.description.as_str())
        .collect();
    assert_eq!(descriptions, ["tx3", "tx2", "tx1", "tx0"]);

    let amounts: Vec<i64> = statement.transactions.iter().map(|tx| tx.amount).collect();
    assert_eq!(amounts, [40, 30, 20, 10]);
    assert_eq!(statement.transactions[0].kind, TransactionKind::Debit);
    assert_eq!(statement.transactions[1].kind, TransactionKind::Credit);

    for pair in statement.transactions.windows(2) {
        assert!(pair[0].occurred_at >= pair[1].occurred_at);
    }

    let last = last.expect("at least one transaction applied");
    assert_eq!(statement.balance, last.balance);
    assert_eq!(statement.limit, last.limit);

    Ok(())
}

#[tokio::test]
async fn test_statement_keeps_only_the_last_ten() -> Result<()> {
    let Some((service, _schema)) = test_service().await? else {
        return Ok(());
    };
    service.create_account(1, 0).await?;

    for amount in 1..=15 {
        credit(&service, 1, amount).await?;
    }

    let statement = service.get_statement(1).await?;
    assert_eq!(statement.transactions.len(), STATEMENT_SIZE);

    let amounts: Vec<i64> = statement.transactions.iter().map(|tx| tx.amount).collect();
    assert_eq!(amounts, (6..=15).rev().collect::<Vec<i64>>());
    assert_eq!(statement.balance, (1..=15).sum::<i64>());
    assert_eq!(service.repository().count_transactions(1).await?, 15);

    Ok(())
}

#[tokio::test]
async fn test_rejected_transactions_do_not_appear() -> Result<()> {
    let Some((service, _schema)) = test_service().await? else {
        return Ok(());
    };
    service.create_account(1, 100).await?;

    debit(&service, 1, 100).await?;
    assert!(debit(&service, 1, 1).await.is_err());

    let statement = service.get_statement(1).await?;
    assert_eq!(statement.transactions.len(), 1);
    assert_eq!(statement.balance, -100);

    Ok(())
}

#[tokio::test]
async fn test_statement_of_unknown_account() -> Result<()> {
    let Some((service, _schema)) = test_service().await? else {
        return Ok(());
    };

    assert!(matches!(
        service.get_statement(6).await,
        Err(AppError::AccountNotFound(6))
    ));

    Ok(())
}

#[tokio::test]
async fn test_statements_are_per_account() -> Result<()> {
    let Some((service, _schema)) = test_service().await? else {
        return Ok(());
    };
    service.create_account(1, 100).await?;
    service.create_account(2, 100).await?;

    credit(&service, 1, 5).await?;
    debit(&service, 2, 7).await?;
    debit(&service, 2, 8).await?;

    let first = service.get_statement(1).await?;
    let second = service.get_statement(2).await?;

    assert_eq!(first.transactions.len(), 1);
    assert_eq!(first.balance, 5);
    assert_eq!(second.transactions.len(), 2);
    assert_eq!(second.balance, -15);

    Ok(())
}
