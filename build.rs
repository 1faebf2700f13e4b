use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic::codec::ProstCodec";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");

    // Messages are declared with prost derives in src/grpc/messages.rs, so
    // only the service stubs are generated here and no protoc is required.
    let send = Method::builder()
        .name("send")
        .route_name("Send")
        .input_type("crate::grpc::messages::SendSmsRequest")
        .output_type("crate::grpc::messages::SendSmsResponse")
        .codec_path(CODEC)
        .build();

    let sender_exists = Method::builder()
        .name("sender_exists")
        .route_name("SenderExists")
        .input_type("crate::grpc::messages::SenderExistsRequest")
        .output_type("crate::grpc::messages::SenderExistsResponse")
        .codec_path(CODEC)
        .build();

    let gateway = Service::builder()
        .name("SmsGateway")
        .package("smsgate.v1")
        .method(send)
        .method(sender_exists)
        .build();

    Builder::new().compile(&[gateway]);

    Ok(())
}
