use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};

use skitter_queue::{QueueConfig, RedisQueue};

/// Spins up a Redis container and returns a connected queue client.
///
/// The `ContainerAsync` must be kept in scope for the test duration —
/// dropping it will stop the container.
pub async fn setup_test_queue() -> (RedisQueue, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("redis", "7")
        .with_exposed_port(ContainerPort::Tcp(6379))
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
        .start()
        .await
        .expect("Failed to start Redis container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("Failed to get port");

    let config = QueueConfig {
        url: format!("redis://{host}:{port}"),
    };

    let queue = RedisQueue::connect(&config)
        .await
        .expect("Failed to connect to Redis");
    queue.health_check().await.expect("Redis not responding");

    (queue, container)
}
