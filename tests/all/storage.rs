use crate::helpers::get_mysql_settings;
use request_consumer::requests::Request;
use request_consumer::storage::configuration::MySqlSettings;
use request_consumer::storage::{MySqlRequestRepository, RequestRepository, StorageError};
use uuid::Uuid;

fn request(uuid: &str, hostname: &str) -> Request {
    Request {
        uuid: uuid.into(),
        hostname: hostname.into(),
    }
}

#[tokio::test]
#[ignore = "requires a MySQL instance on localhost:3306"]
async fn connect_creates_the_database_and_the_table() {
    let settings = get_mysql_settings();

    let repository = MySqlRequestRepository::connect(&settings).await.unwrap();
    // Running it twice is harmless.
    repository.migrate().await.unwrap();

    assert!(repository.find_by_uuid("missing").await.unwrap().is_none());
    repository.close().await;
}

#[tokio::test]
#[ignore = "requires a MySQL instance on localhost:3306"]
async fn inserted_requests_can_be_read_back() {
    let repository = MySqlRequestRepository::connect(&get_mysql_settings())
        .await
        .unwrap();
    let uuid = Uuid::new_v4().to_string();

    let stored = repository.insert(&request(&uuid, "node-1")).await.unwrap();

    assert!(stored.id > 0);
    let found = repository.find_by_uuid(&uuid).await.unwrap().unwrap();
    assert_eq!(found, stored);
    repository.close().await;
}

#[tokio::test]
#[ignore = "requires a MySQL instance on localhost:3306"]
async fn duplicated_uuid_is_refused_and_the_first_row_is_kept() {
    let repository = MySqlRequestRepository::connect(&get_mysql_settings())
        .await
        .unwrap();
    repository.insert(&request("abc", "node-1")).await.unwrap();

    let error = repository
        .insert(&request("abc", "node-2"))
        .await
        .unwrap_err();

    assert!(matches!(error, StorageError::Duplicate(ref uuid) if uuid == "abc"));
    assert!(error.is_permanent());
    let found = repository.find_by_uuid("abc").await.unwrap().unwrap();
    assert_eq!(found.hostname, "node-1");
    repository.close().await;
}

#[tokio::test]
async fn invalid_database_name_is_refused_before_connecting() {
    let settings =
        MySqlSettings::from_endpoint("localhost:3306", "root:root", "edu`; DROP DATABASE x").unwrap();

    let error = MySqlRequestRepository::connect(&settings).await.unwrap_err();

    assert!(matches!(error, StorageError::InvalidDatabaseName(_)));
}
