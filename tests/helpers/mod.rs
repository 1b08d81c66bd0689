pub mod api_test_helper;
pub mod mock_gateway;
